use buildlink_core::portal::{CONVERSATIONS_KEY, USERS_KEY};
use buildlink_core::{
    AccountError, MessagingError, Portal, PortalError, RegistrationForm,
};
use buildlink_db::Database;
use buildlink_types::models::{ConversationRef, Role, VerificationStatus};

const PASSWORD: &str = "Secur3!";
const CLIENT: &str = "client@x.com";
const ARCHITECT: &str = "arch@x.com";

fn form(email: &str, role: Role) -> RegistrationForm {
    RegistrationForm {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        role,
    }
}

fn seeded_portal() -> Portal {
    let mut portal = Portal::open(Database::open_in_memory().unwrap()).unwrap();
    portal.register(form(CLIENT, Role::Client)).unwrap();
    portal.register(form(ARCHITECT, Role::Architect)).unwrap();
    portal
}

#[test]
fn first_message_through_pending_reference_creates_conversation() {
    let mut portal = seeded_portal();

    let reference = portal.start_conversation(CLIENT, ARCHITECT).unwrap();
    assert_eq!(reference, ConversationRef::Pending(ARCHITECT.to_string()));

    let sent = portal.send_message(CLIENT, &reference, "hello").unwrap();
    assert!(sent.created);
    assert_eq!(sent.message.to, ARCHITECT);
    assert_eq!(portal.conversations().len(), 1);

    // The architect replies through the real id.
    let reply_ref = portal.start_conversation(ARCHITECT, CLIENT).unwrap();
    assert_eq!(reply_ref, ConversationRef::Existing(sent.conversation_id));
    let reply = portal.send_message(ARCHITECT, &reply_ref, "hi back").unwrap();
    assert!(!reply.created);
    assert_eq!(reply.conversation_id, sent.conversation_id);

    let thread = portal.thread(CLIENT, &reference).unwrap();
    assert_eq!(thread.other.email, ARCHITECT);
    let bodies: Vec<_> = thread
        .conversation
        .unwrap()
        .messages
        .iter()
        .map(|m| m.body.as_str())
        .collect();
    assert_eq!(bodies, ["hello", "hi back"]);
}

#[test]
fn send_rejects_bad_input() {
    let mut portal = seeded_portal();
    let to_arch = ConversationRef::Pending(ARCHITECT.to_string());

    let err = portal.send_message(CLIENT, &to_arch, "   ").unwrap_err();
    assert!(matches!(err, PortalError::Messaging(MessagingError::EmptyBody)));

    let to_self = ConversationRef::Pending(CLIENT.to_string());
    let err = portal.send_message(CLIENT, &to_self, "hi").unwrap_err();
    assert!(matches!(err, PortalError::Messaging(MessagingError::SelfMessage)));

    let to_ghost = ConversationRef::Pending("ghost@x.com".to_string());
    let err = portal.send_message(CLIENT, &to_ghost, "hi").unwrap_err();
    assert!(matches!(
        err,
        PortalError::Messaging(MessagingError::UnknownRecipient)
    ));

    assert!(portal.conversations().is_empty());
}

#[test]
fn reopen_restores_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buildlink.db");

    let conversation_id = {
        let mut portal = Portal::open(Database::open(&path).unwrap()).unwrap();
        portal.register(form(ARCHITECT, Role::Architect)).unwrap();
        portal.submit_verification(ARCHITECT).unwrap();
        portal.register(form(CLIENT, Role::Client)).unwrap();
        portal
            .send_message(
                CLIENT,
                &ConversationRef::Pending(ARCHITECT.to_string()),
                "hello",
            )
            .unwrap()
            .conversation_id
    };

    let portal = Portal::open(Database::open(&path).unwrap()).unwrap();
    assert_eq!(portal.accounts().len(), 2);
    assert_eq!(
        portal.accounts().get(ARCHITECT).unwrap().verification(),
        Some(VerificationStatus::Pending)
    );
    assert_eq!(
        portal.conversations().get(conversation_id).unwrap().messages[0].body,
        "hello"
    );
    // Registration logs in, so the last registrant holds the session.
    assert_eq!(portal.current_session().unwrap().email, CLIENT);
}

#[test]
fn login_and_logout_move_the_session() {
    let mut portal = seeded_portal();
    assert_eq!(portal.current_session().unwrap().email, ARCHITECT);

    let err = portal.login(CLIENT, "Wrong1!").unwrap_err();
    assert!(matches!(
        err,
        PortalError::Account(AccountError::IncorrectPassword)
    ));
    assert_eq!(portal.current_session().unwrap().email, ARCHITECT);

    portal.login(CLIENT, PASSWORD).unwrap();
    assert_eq!(portal.current_session().unwrap().email, CLIENT);

    portal.logout(CLIENT).unwrap();
    assert!(portal.current_session().is_none());
}

#[test]
fn logout_leaves_another_accounts_session_alone() {
    let mut portal = seeded_portal();
    portal.login(CLIENT, PASSWORD).unwrap();
    portal.login(ARCHITECT, PASSWORD).unwrap();

    portal.logout(CLIENT).unwrap();
    assert_eq!(portal.current_session().unwrap().email, ARCHITECT);

    portal.logout(ARCHITECT).unwrap();
    assert!(portal.current_session().is_none());
}

#[test]
fn failed_write_leaves_portal_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buildlink.db");

    let mut portal = Portal::open(Database::open(&path).unwrap()).unwrap();
    portal.register(form(CLIENT, Role::Client)).unwrap();
    portal.register(form(ARCHITECT, Role::Architect)).unwrap();
    let to_arch = ConversationRef::Pending(ARCHITECT.to_string());
    portal.send_message(CLIENT, &to_arch, "hello").unwrap();

    // Pull the table out from under the portal.
    let other = Database::open(&path).unwrap();
    other
        .with_conn(|conn| {
            conn.execute_batch("DROP TABLE blobs")?;
            Ok(())
        })
        .unwrap();

    let late = "late@x.com";
    for _ in 0..2 {
        let err = portal.register(form(late, Role::Client)).unwrap_err();
        assert!(matches!(err, PortalError::Storage(_)), "{err}");
    }
    assert_eq!(portal.accounts().len(), 2);
    assert!(portal.accounts().get(late).is_none());
    assert_eq!(portal.current_session().unwrap().email, ARCHITECT);

    let err = portal.send_message(ARCHITECT, &ConversationRef::Pending(CLIENT.to_string()), "reply").unwrap_err();
    assert!(matches!(err, PortalError::Storage(_)));
    let thread = portal.thread(CLIENT, &to_arch).unwrap();
    assert_eq!(thread.conversation.unwrap().messages.len(), 1);

    let err = portal.submit_verification(ARCHITECT).unwrap_err();
    assert!(matches!(err, PortalError::Storage(_)));
    assert_eq!(
        portal.accounts().get(ARCHITECT).unwrap().verification(),
        Some(VerificationStatus::Unverified)
    );
}

#[test]
fn inbox_skips_conversations_with_unknown_accounts() {
    let db = Database::open_in_memory().unwrap();
    let mut portal = Portal::open(db).unwrap();
    portal.register(form(CLIENT, Role::Client)).unwrap();
    portal.register(form(ARCHITECT, Role::Architect)).unwrap();
    portal
        .send_message(
            CLIENT,
            &ConversationRef::Pending(ARCHITECT.to_string()),
            "hello",
        )
        .unwrap();

    // Splice in a thread with an account that does not exist.
    let mut conversations = serde_json::to_value(portal.conversations()).unwrap();
    conversations.as_array_mut().unwrap().push(serde_json::json!({
        "id": "7f1c9a52-8c1e-4a8e-9a57-2d43b3f0c111",
        "participants": [CLIENT, "ghost@x.com"],
        "messages": [{
            "id": "0b9d5e0c-3a43-4f6e-8d3e-52f1f1c2a222",
            "from": "ghost@x.com",
            "to": CLIENT,
            "body": "boo",
            "timestamp": "2030-01-01T00:00:00Z"
        }]
    }));
    let users = serde_json::to_string(portal.accounts()).unwrap();
    let db = Database::open_in_memory().unwrap();
    db.put_blob(USERS_KEY, &users).unwrap();
    db.put_blob(CONVERSATIONS_KEY, &conversations.to_string())
        .unwrap();

    let portal = Portal::open(db).unwrap();
    assert_eq!(portal.conversations().list_for_user(CLIENT).len(), 2);
    let inbox = portal.inbox(CLIENT);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].other.email, ARCHITECT);
}

#[test]
fn corrupt_document_fails_open() {
    let db = Database::open_in_memory().unwrap();
    db.put_blob(USERS_KEY, "{not json").unwrap();
    assert!(Portal::open(db).is_err());
}

#[test]
fn admin_verification_is_persisted() {
    let mut portal = seeded_portal();
    portal.submit_verification(ARCHITECT).unwrap();
    let verified = portal.mark_verified(ARCHITECT).unwrap();
    assert_eq!(verified.verification(), Some(VerificationStatus::Verified));
    assert_eq!(
        portal.accounts().get(ARCHITECT).unwrap().verification(),
        Some(VerificationStatus::Verified)
    );
}
