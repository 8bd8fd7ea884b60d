use axum::http::StatusCode;
use serde_json::json;

use crate::client::Backend;
use crate::client::Collection;
use crate::ids::Id;
use crate::notes::Permission;
use crate::tests::helper;
use crate::tests::helper::Browser;
use crate::users::Role;

#[tokio::test]
async fn test_admin_login_lands_on_admin_panel() {
    let (mut app, _) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let landing = helper::notes_login(
        &mut app,
        &mut browser,
        helper::ADMIN_EMAIL,
        helper::ADMIN_PASSWORD,
    )
    .await;
    assert_eq!("/notes/admin", landing);

    let page = browser.get(&mut app, "/notes/admin").await;
    assert_eq!(StatusCode::OK, page.status_code);
    assert!(page.body.contains("Admin panel"));
    assert!(page.body.contains("Logout"));
}

#[tokio::test]
async fn test_wrong_password_writes_no_session() {
    let (mut app, _) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let landing =
        helper::notes_login(&mut app, &mut browser, helper::ADMIN_USERNAME, "VerySecret").await;
    assert_eq!("/notes/login", landing);

    let page = browser.get(&mut app, "/notes/login").await;
    assert!(page.body.contains("Invalid credentials"));

    // shown once
    let page = browser.get(&mut app, "/notes/login").await;
    assert!(!page.body.contains("Invalid credentials"));

    let page = browser.get(&mut app, "/notes/home").await;
    assert_eq!("/notes/login", page.redirected_to());
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let form = [
        ("username", "ada"),
        ("email", "ada@example.com"),
        ("password", "secret1"),
    ];

    let page = browser.post(&mut app, "/notes/register", &form).await;
    assert_eq!("/notes/login", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("Registration successful"));

    let users = backends.notes.find_users(&[("username", "ada")]).await.unwrap();
    assert_eq!(1, users.len());
    assert_eq!(Role::User, users[0].role);
    assert!(users[0].registration_date.is_some());

    let page = browser
        .post(
            &mut app,
            "/notes/register",
            &[
                ("username", "other"),
                ("email", "ada@example.com"),
                ("password", "secret1"),
            ],
        )
        .await;
    assert_eq!("/notes/register", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("already registered"));
    assert_eq!(2, backends.notes.list_users().await.unwrap().len());
}

#[tokio::test]
async fn test_guards() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    for path in ["/notes/home", "/notes/profile", "/notes/admin", "/notes/note"] {
        let page = browser.get(&mut app, path).await;
        assert_eq!("/notes/login", page.redirected_to(), "{path}");
    }

    let page = browser.get(&mut app, "/notes/nope").await;
    assert_eq!("/notes/login", page.redirected_to());

    let page = browser.get(&mut app, "/notes").await;
    assert_eq!("/notes/login", page.redirected_to());

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser.get(&mut app, "/notes/admin").await;
    assert_eq!("/notes/home", page.redirected_to());

    let page = browser.get(&mut app, "/notes/home").await;
    assert_eq!(StatusCode::OK, page.status_code);
    assert!(page.body.contains("My notes"));
    assert!(!page.body.contains(r#"href="/notes/admin""#));
}

#[tokio::test]
async fn test_create_then_edit_keeps_shares_and_image() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let ada = helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::create_notes_user(&backends, "bob", "secret2").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser
        .post(
            &mut app,
            "/notes/note",
            &[
                ("id", ""),
                ("title", "A"),
                ("content", "B"),
                ("image_url", "https://example.com/a.png"),
            ],
        )
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let notes = backends.notes.list_notes().await.unwrap();
    assert_eq!(1, notes.len());
    assert_eq!(Some(helper::id_of(&ada)), notes[0].owner_id.as_ref().map(Id::to_string));
    assert!(notes[0].shared_with.is_empty());

    let note_id = notes[0].id.to_string();

    let page = browser
        .post(
            &mut app,
            "/notes/note/share",
            &[("id", note_id.as_str()), ("identifier", "bob"), ("permission", "edit")],
        )
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let page = browser
        .post(
            &mut app,
            "/notes/note",
            &[
                ("id", note_id.as_str()),
                ("title", "A2"),
                ("content", "B2"),
                ("image_url", ""),
            ],
        )
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let note = backends.notes.get_note(&notes[0].id).await.unwrap().unwrap();
    assert_eq!("A2", note.title);
    assert_eq!("B2", note.content);
    assert_eq!(Some("https://example.com/a.png"), note.image());
    assert_eq!(1, note.shared_with.len());
}

#[tokio::test]
async fn test_sharing_twice_replaces_the_permission() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    let bob = helper::create_notes_user(&backends, "bob", "secret2").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    browser
        .post(
            &mut app,
            "/notes/note",
            &[("id", ""), ("title", "A"), ("content", "B")],
        )
        .await;

    let note_id = backends.notes.list_notes().await.unwrap()[0].id.clone();
    let id = note_id.to_string();

    for permission in ["readonly", "edit"] {
        let page = browser
            .post(
                &mut app,
                "/notes/note/share",
                &[("id", id.as_str()), ("identifier", "bob@example.com"), ("permission", permission)],
            )
            .await;
        assert_eq!("/notes/home", page.redirected_to());
    }

    let page = browser.get(&mut app, "/notes/home").await;
    assert!(page.body.contains("changed to edit"));

    let note = backends.notes.get_note(&note_id).await.unwrap().unwrap();
    assert_eq!(1, note.shared_with.len());
    assert_eq!(helper::id_of(&bob), note.shared_with[0].user_id.to_string());
    assert_eq!(Permission::Edit, note.shared_with[0].permission);

    // with oneself, unknown users and bad permissions
    for (identifier, permission, message) in [
        ("ada", "edit", "share a note with yourself"),
        ("nobody", "edit", "User not found"),
        ("bob", "owner", "Invalid permission"),
    ] {
        browser
            .post(
                &mut app,
                "/notes/note/share",
                &[("id", id.as_str()), ("identifier", identifier), ("permission", permission)],
            )
            .await;

        let page = browser.get(&mut app, "/notes/home").await;
        assert!(page.body.contains(message), "{message}");
    }

    let note = backends.notes.get_note(&note_id).await.unwrap().unwrap();
    assert_eq!(1, note.shared_with.len());
}

#[tokio::test]
async fn test_read_only_sharee_can_not_edit() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut owner = Browser::new();
    let mut sharee = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::create_notes_user(&backends, "bob", "secret2").await;
    helper::notes_login(&mut app, &mut owner, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut sharee, "bob", "secret2").await;

    owner
        .post(
            &mut app,
            "/notes/note",
            &[("id", ""), ("title", "Plans"), ("content", "Secret plans")],
        )
        .await;

    let note_id = backends.notes.list_notes().await.unwrap()[0].id.clone();
    let id = note_id.to_string();

    // not shared yet
    let page = sharee.get(&mut app, &format!("/notes/note?id={id}")).await;
    assert_eq!("/notes/home", page.redirected_to());

    owner
        .post(
            &mut app,
            "/notes/note/share",
            &[("id", id.as_str()), ("identifier", "bob"), ("permission", "readonly")],
        )
        .await;

    let page = sharee.get(&mut app, "/notes/home").await;
    assert!(page.body.contains("Plans"));

    let page = sharee.get(&mut app, &format!("/notes/note?id={id}")).await;
    assert_eq!(StatusCode::OK, page.status_code);
    assert!(page.body.contains(" disabled"));
    assert!(!page.body.contains("Save</button>"));

    let page = sharee
        .post(
            &mut app,
            "/notes/note",
            &[("id", id.as_str()), ("title", "Mine"), ("content", "Now")],
        )
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let page = sharee
        .post(&mut app, "/notes/note/delete", &[("id", id.as_str())])
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let note = backends.notes.get_note(&note_id).await.unwrap().unwrap();
    assert_eq!("Plans", note.title);
}

#[tokio::test]
async fn test_remove_image() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    browser
        .post(
            &mut app,
            "/notes/note",
            &[
                ("id", ""),
                ("title", "A"),
                ("content", "B"),
                ("image_url", "data:image/png;base64,AAAA"),
            ],
        )
        .await;

    let note_id = backends.notes.list_notes().await.unwrap()[0].id.clone();
    let id = note_id.to_string();

    let page = browser
        .post(&mut app, "/notes/note/remove-image", &[("id", id.as_str())])
        .await;
    assert_eq!(format!("/notes/note?id={id}"), page.redirected_to());

    let note = backends.notes.get_note(&note_id).await.unwrap().unwrap();
    assert_eq!(None, note.image());
}

#[tokio::test]
async fn test_invalid_image_is_rejected() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser
        .post(
            &mut app,
            "/notes/note",
            &[
                ("id", ""),
                ("title", "A"),
                ("content", "B"),
                ("image_url", "javascript:alert(1)"),
            ],
        )
        .await;
    assert_eq!("/notes/note", page.redirected_to());
    assert!(backends.notes.list_notes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_change_password() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser
        .post(&mut app, "/notes/profile", &[("password", "short")])
        .await;
    assert_eq!("/notes/profile", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("at least 6 characters"));

    let page = browser
        .post(&mut app, "/notes/profile", &[("password", "longer-secret")])
        .await;
    assert_eq!("/notes/profile", page.redirected_to());

    browser.post(&mut app, "/notes/logout", &[]).await;

    let mut other = Browser::new();
    let landing = helper::notes_login(&mut app, &mut other, "ada", "secret1").await;
    assert_eq!("/notes/login", landing);

    let landing = helper::notes_login(&mut app, &mut other, "ada", "longer-secret").await;
    assert_eq!("/notes/home", landing);
}

#[tokio::test]
async fn test_admin_can_not_delete_themselves() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let bob = helper::create_notes_user(&backends, "bob", "secret2").await;
    helper::notes_login(
        &mut app,
        &mut browser,
        helper::ADMIN_USERNAME,
        helper::ADMIN_PASSWORD,
    )
    .await;

    let admin = backends
        .notes
        .find_users(&[("username", helper::ADMIN_USERNAME)])
        .await
        .unwrap()
        .remove(0);

    let admin_id = admin.id.to_string();

    let page = browser
        .post(
            &mut app,
            "/notes/admin/users/delete",
            &[("id", admin_id.as_str())],
        )
        .await;
    assert_eq!("/notes/admin", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("can not delete your own admin account"));

    let bob_id = helper::id_of(&bob);

    let page = browser
        .post(
            &mut app,
            "/notes/admin/users/delete",
            &[("id", bob_id.as_str())],
        )
        .await;
    assert_eq!("/notes/admin", page.redirected_to());

    let users = backends.notes.list_users().await.unwrap();
    assert_eq!(1, users.len());
    assert_eq!(admin.id, users[0].id);
}

#[tokio::test]
async fn test_admin_actions_need_an_admin() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser
        .post(&mut app, "/notes/admin/users/delete", &[("id", "1")])
        .await;
    assert_eq!("/notes/home", page.redirected_to());
    assert_eq!(2, backends.notes.list_users().await.unwrap().len());

    let page = browser
        .post(&mut app, "/notes/admin/subscriptions/email", &[])
        .await;
    assert_eq!("/notes/home", page.redirected_to());
}

#[tokio::test]
async fn test_subscriptions() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let page = browser
        .post(
            &mut app,
            "/notes/subscribe",
            &[("email", "reader@example.com"), ("return_to", "/register")],
        )
        .await;
    assert_eq!("/notes/register", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("Thanks for subscribing"));

    // only screens of the app are valid targets
    let page = browser
        .post(
            &mut app,
            "/notes/subscribe",
            &[("email", "invalid"), ("return_to", "https://example.com")],
        )
        .await;
    assert_eq!("/notes/login", page.redirected_to());

    let subscriptions = backends.notes.list_subscriptions().await.unwrap();
    assert_eq!(1, subscriptions.len());
    assert_eq!("reader@example.com", subscriptions[0].email);

    helper::notes_login(
        &mut app,
        &mut browser,
        helper::ADMIN_USERNAME,
        helper::ADMIN_PASSWORD,
    )
    .await;

    let page = browser.get(&mut app, "/notes/admin").await;
    assert!(page.body.contains("reader@example.com"));

    let page = browser
        .post(&mut app, "/notes/admin/subscriptions/email", &[])
        .await;
    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("not available"));

    let subscription_id = subscriptions[0].id.to_string();

    browser
        .post(
            &mut app,
            "/notes/admin/subscriptions/delete",
            &[("id", subscription_id.as_str())],
        )
        .await;
    assert!(backends.notes.list_subscriptions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_textual_ids_keep_their_leading_zeros() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    let ada = helper::create_notes_user(&backends, "ada", "secret1").await;
    backends
        .notes_store
        .create(
            Collection::Notes,
            json!({
                "id": "0123",
                "title": "Zero padded",
                "content": "Imported",
                "ownerId": ada["id"],
            }),
        )
        .await
        .unwrap();
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser.get(&mut app, "/notes/note?id=0123").await;
    assert_eq!(StatusCode::OK, page.status_code);
    assert!(page.body.contains("Zero padded"));
    assert!(page.body.contains(r#"value="0123""#));

    let page = browser
        .post(&mut app, "/notes/note/delete", &[("id", "0123")])
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("Note deleted"));

    let id = Id::Text(String::from("0123"));
    assert!(backends.notes.get_note(&id).await.unwrap().is_none());
}

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[tokio::test]
async fn test_uploaded_image_is_inlined() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser
        .post_multipart(
            &mut app,
            "/notes/note",
            &[
                ("id", ""),
                ("title", "Cat"),
                ("content", "Picture"),
                ("image_url", "https://example.com/ignored.png"),
            ],
            &[("image_file", "cat.png", "image/png", PNG)],
        )
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let notes = backends
        .notes_store
        .list(Collection::Notes, &[])
        .await
        .unwrap();
    assert_eq!(1, notes.len());

    let image_url = notes[0]["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("data:image/png;base64,"), "{image_url}");
    assert_eq!("data:image/png;base64,iVBORw0KGgo=", image_url);

    // no file picked, the stored image stays
    let id = helper::id_of(&notes[0]);
    let page = browser
        .post_multipart(
            &mut app,
            "/notes/note",
            &[
                ("id", id.as_str()),
                ("title", "Cat 2"),
                ("content", "Picture"),
                ("image_url", ""),
            ],
            &[("image_file", "", "application/octet-stream", &[])],
        )
        .await;
    assert_eq!("/notes/home", page.redirected_to());

    let note = backends.notes.list_notes().await.unwrap().remove(0);
    assert_eq!("Cat 2", note.title);
    assert_eq!(Some(image_url), note.image());
}

#[tokio::test]
async fn test_uploaded_file_must_be_an_image() {
    let (mut app, backends) = helper::setup_test_app().await;
    let mut browser = Browser::new();

    helper::create_notes_user(&backends, "ada", "secret1").await;
    helper::notes_login(&mut app, &mut browser, "ada", "secret1").await;

    let page = browser
        .post_multipart(
            &mut app,
            "/notes/note",
            &[("id", ""), ("title", "A"), ("content", "B"), ("image_url", "")],
            &[("image_file", "notes.txt", "text/plain", b"hello")],
        )
        .await;
    assert_eq!("/notes/note", page.redirected_to());

    let page = browser.follow(&mut app, &page).await;
    assert!(page.body.contains("The uploaded file must be an image"));
    assert!(backends.notes.list_notes().await.unwrap().is_empty());
}
