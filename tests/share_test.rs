//! Integration tests for recursive sharing, revocation and the views of a
//! grantee.

mod helpers;

use cloudvault_core::error::{ConflictReason, ErrorKind};
use cloudvault_core::types::{DirectoryRef, ItemRef};
use cloudvault_entity::access::Visibility;
use cloudvault_entity::directory::Directory;
use cloudvault_service::RequestContext;
use cloudvault_service::file::FileView;

/// Alice's tree: `Docs/{report.pdf, A/{x.txt}}` next to `Private/{secret.txt}`.
struct Scenario {
    app: helpers::TestApp,
    alice: RequestContext,
    bob: RequestContext,
    docs: Directory,
    a: Directory,
    private: Directory,
    report: FileView,
    x: FileView,
    secret: FileView,
}

async fn scenario() -> Scenario {
    let app = helpers::TestApp::new().await;
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;

    let docs = app.mkdir(&alice, "Docs", DirectoryRef::Root).await;
    let a = app.mkdir(&alice, "A", docs.to_ref()).await;
    let private = app.mkdir(&alice, "Private", DirectoryRef::Root).await;
    let report = app.upload(&alice, docs.to_ref(), "report.pdf", b"%PDF-1.4").await;
    let x = app.upload(&alice, a.to_ref(), "x.txt", b"x").await;
    let secret = app.upload(&alice, private.to_ref(), "secret.txt", b"s").await;

    Scenario {
        app,
        alice,
        bob,
        docs,
        a,
        private,
        report,
        x,
        secret,
    }
}

impl Scenario {
    async fn share_docs(&self) -> u64 {
        self.app
            .services
            .directories
            .share_directory(&self.alice, self.docs.id, "bob@example.com")
            .await
            .unwrap()
            .propagated
    }
}

#[tokio::test]
async fn test_share_reaches_whole_subtree_only() {
    let s = scenario().await;
    assert_eq!(s.share_docs().await, 3);

    let dirs = &s.app.services.directories;
    let docs = dirs.list_directory(&s.bob, s.docs.to_ref()).await.unwrap();
    assert_eq!(docs.visibility, Visibility::SharedDirect);
    assert_eq!(docs.subdirectories.len(), 1);
    assert!(docs.subdirectories[0].is_shared);
    assert_eq!(docs.files.len(), 1);

    let a = dirs.list_directory(&s.bob, s.a.to_ref()).await.unwrap();
    assert_eq!(a.files[0].id, s.x.id);

    let files = &s.app.services.files;
    assert!(files.get_file(&s.bob, s.report.id).await.unwrap().is_shared);

    let err = dirs
        .list_directory(&s.bob, s.private.to_ref())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = files.get_file(&s.bob, s.secret.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_friend_sees_shared_entry_points_at_root() {
    let s = scenario().await;
    s.share_docs().await;

    let home = s
        .app
        .services
        .directories
        .list_directory(&s.bob, DirectoryRef::Root)
        .await
        .unwrap();

    assert!(home.subdirectories.is_empty());
    let shared: Vec<&str> = home
        .shared_directories
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(shared, vec!["Docs"]);

    // Files directly inside a shared top-level directory surface at the
    // friend's root; deeper files do not.
    let names: Vec<&str> = home.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["report.pdf"]);

    let incoming = s
        .app
        .services
        .directories
        .list_shared_with_me(&s.bob)
        .await
        .unwrap();
    assert_eq!(incoming.directories.len(), 1);
    assert_eq!(incoming.files.len(), 2);
}

#[tokio::test]
async fn test_up_link_falls_back_to_own_root() {
    let s = scenario().await;
    s.share_docs().await;
    let dirs = &s.app.services.directories;

    let docs = dirs.list_directory(&s.bob, s.docs.to_ref()).await.unwrap();
    assert_eq!(docs.parent, Some(DirectoryRef::Root));
    let crumbs: Vec<&str> = docs.path.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(crumbs, vec![s.app.config.tree.home_label.as_str(), "Docs"]);
    assert!(docs.path[1].is_shared);

    let a = dirs.list_directory(&s.bob, s.a.to_ref()).await.unwrap();
    assert_eq!(a.parent, Some(s.docs.to_ref()));
    assert_eq!(a.path.len(), 3);

    let carol = s.app.user("carol@example.com").await;
    dirs.share_directory(&s.alice, s.a.id, "carol@example.com")
        .await
        .unwrap();
    let nested = dirs.list_directory(&carol, s.a.to_ref()).await.unwrap();
    assert_eq!(nested.parent, Some(DirectoryRef::Root));
    assert_eq!(nested.path.len(), 2);
}

#[tokio::test]
async fn test_revocation_removes_every_grant() {
    let s = scenario().await;
    s.share_docs().await;
    let dirs = &s.app.services.directories;

    let removed = dirs
        .unshare_directory(&s.alice, s.docs.id, s.bob.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 4);

    for dir in [&s.docs, &s.a] {
        let err = dirs.list_directory(&s.bob, dir.to_ref()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    for file in [&s.report, &s.x] {
        let err = s.app.services.files.get_file(&s.bob, file.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    let home = dirs.list_directory(&s.bob, DirectoryRef::Root).await.unwrap();
    assert!(home.shared_directories.is_empty());
    assert!(home.files.is_empty());

    let again = dirs
        .unshare_directory(&s.alice, s.docs.id, s.bob.user_id)
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn test_unsharing_nested_directory_takes_effect() {
    let s = scenario().await;
    s.share_docs().await;
    let dirs = &s.app.services.directories;
    let files = &s.app.services.files;

    let removed = dirs
        .unshare_directory(&s.alice, s.a.id, s.bob.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let err = dirs.list_directory(&s.bob, s.a.to_ref()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = files.get_file(&s.bob, s.x.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = files.download(&s.bob, s.x.id, false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The rest of the shared tree is untouched.
    let docs = dirs.list_directory(&s.bob, s.docs.to_ref()).await.unwrap();
    assert!(docs.subdirectories.is_empty());
    assert_eq!(docs.files[0].id, s.report.id);

    let archive = dirs.download_archive(&s.bob, s.docs.to_ref()).await.unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(archive.data.to_vec())).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"Docs/report.pdf"));
    assert!(!names.iter().any(|n| n.starts_with("Docs/A")));
}

#[tokio::test]
async fn test_up_link_skips_unshared_parent() {
    let s = scenario().await;
    let dirs = &s.app.services.directories;
    let p = s.app.mkdir(&s.alice, "P", s.docs.to_ref()).await;
    let c = s.app.mkdir(&s.alice, "C", p.to_ref()).await;

    s.share_docs().await;
    dirs.unshare_directory(&s.alice, p.id, s.bob.user_id)
        .await
        .unwrap();
    dirs.share_directory(&s.alice, c.id, "bob@example.com")
        .await
        .unwrap();

    let listing = dirs.list_directory(&s.bob, c.to_ref()).await.unwrap();
    assert_eq!(listing.parent, Some(s.docs.to_ref()));
    let crumbs: Vec<&str> = listing.path.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(crumbs, vec![s.app.config.tree.home_label.as_str(), "C"]);
}

#[tokio::test]
async fn test_share_rejections() {
    let s = scenario().await;
    let dirs = &s.app.services.directories;

    let err = dirs
        .share_directory(&s.alice, s.docs.id, "alice@example.com")
        .await
        .unwrap_err();
    assert!(err.is_conflict(ConflictReason::SelfShare));

    let err = dirs
        .share_directory(&s.alice, s.docs.id, "nobody@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = dirs
        .share_directory(&s.alice, s.docs.id, "not-an-email")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    s.share_docs().await;
    let err = dirs
        .share_directory(&s.alice, s.docs.id, "bob@example.com")
        .await
        .unwrap_err();
    assert!(err.is_conflict(ConflictReason::AlreadyShared));

    let err = dirs
        .share_directory(&s.bob, s.docs.id, "alice@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_grantee_cannot_mutate() {
    let s = scenario().await;
    s.share_docs().await;
    let dirs = &s.app.services.directories;

    let err = dirs
        .rename_directory(&s.bob, s.docs.id, "Mine")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = dirs
        .move_directory(&s.bob, s.a.id, DirectoryRef::Root)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = dirs
        .delete_directory(&s.bob, s.docs.to_ref())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = dirs
        .add_directory(&s.bob, "Sneaky", s.docs.to_ref())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = s
        .app
        .services
        .files
        .delete_file(&s.bob, s.report.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_unshare_permissions() {
    let s = scenario().await;
    s.share_docs().await;
    let carol = s.app.user("carol@example.com").await;
    let dirs = &s.app.services.directories;

    let err = dirs
        .unshare_directory(&carol, s.docs.id, s.bob.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let removed = dirs
        .unshare_directory(&s.bob, s.docs.id, s.bob.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 4);
}

#[tokio::test]
async fn test_share_listings() {
    let s = scenario().await;
    s.share_docs().await;
    let shares = &s.app.services.shares;

    let grantees = shares
        .list_grantees(&s.alice, ItemRef::Directory(s.docs.id))
        .await
        .unwrap();
    assert_eq!(grantees.len(), 1);
    assert_eq!(grantees[0].email, "bob@example.com");

    let err = shares
        .list_grantees(&s.bob, ItemRef::Directory(s.docs.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let outgoing = shares.list_outgoing(&s.alice).await.unwrap();
    assert_eq!(outgoing.len(), 4);
    assert!(
        outgoing
            .iter()
            .any(|o| o.item == ItemRef::Directory(s.docs.id) && o.name == "Docs")
    );
    assert!(shares.list_outgoing(&s.bob).await.unwrap().is_empty());
}
