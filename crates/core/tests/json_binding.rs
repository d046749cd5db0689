//! JSON binding: merge-decode followed by validation.

mod models;

use formbind_core::{Classification, FieldError, FilePart, FileRef, bind_json};
use models::{BlogPost, OwnedDraft, Person, Post, Reviewer, context, expected, summary};
use std::error::Error;

#[test]
fn valid_document_binds_cleanly() {
    let body = br#"{"title": "Hello JSON world", "content": "Body"}"#;
    let mut post = Post::default();
    let errors = bind_json(&mut post, &body[..], &context());
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(post.title, "Hello JSON world");
    assert_eq!(post.content, "Body");
}

#[test]
fn malformed_document_still_validates() {
    let mut post = Post::default();
    let errors = bind_json(&mut post, &b"{\"title\":"[..], &context());
    assert_eq!(
        summary(&errors),
        expected(&[
            ("", "DeserializationError"),
            ("title", "RequiredError"),
            ("title", "LengthError"),
        ])
    );
}

#[test]
fn empty_body_binds_nothing() {
    let mut post = Post {
        title: "Already a long title".to_string(),
        content: String::new(),
    };
    let errors = bind_json(&mut post, &b""[..], &context());
    assert!(errors.is_empty());
    assert_eq!(post.title, "Already a long title");
}

#[test]
fn omitted_keys_keep_caller_defaults() {
    let mut post = Post {
        title: String::new(),
        content: "default content".to_string(),
    };
    let errors = bind_json(&mut post, &br#"{"title": "Title from JSON"}"#[..], &context());
    assert!(errors.is_empty());
    assert_eq!(post.content, "default content");
}

#[test]
fn nested_documents_bind_and_validate() -> Result<(), Box<dyn Error>> {
    let body = serde_json::to_vec(&serde_json::json!({
        "title": "Nested blog post",
        "content": "Body",
        "id": 12,
        "ratings": [5, 4],
        "author": {"name": "Ann", "email": "ann@example.com"},
        "coauthor": {"name": "", "email": ""}
    }))?;
    let mut blog = BlogPost::default();
    let errors = bind_json(&mut blog, body.as_slice(), &context());

    assert_eq!(blog.id, 12);
    assert_eq!(blog.ratings, vec![5, 4]);
    assert_eq!(blog.author.name, "Ann");
    assert_eq!(blog.coauthor.as_deref(), Some(&Person::default()));
    assert_eq!(summary(&errors), expected(&[("name", "RequiredError")]));
    Ok(())
}

#[test]
fn wrong_types_are_a_deserialization_error() {
    let mut blog = BlogPost::default();
    let errors = bind_json(
        &mut blog,
        &br#"{"title": "Typed blog post", "id": "twelve"}"#[..],
        &context(),
    );
    let Some(first) = errors.iter().next() else {
        panic!("expected errors");
    };
    assert_eq!(first.kind(), &Classification::Deserialization);
    assert!(errors.has(&Classification::Required));
    assert_eq!(blog.id, 0);
}

#[test]
fn json_targets_follow_the_same_preconditions() {
    let errors = bind_json(Post::default(), &b"{}"[..], &context());
    assert_eq!(errors.into_vec(), vec![FieldError::input_not_by_reference()]);

    let mut posts: Vec<Post> = Vec::new();
    let errors = bind_json(&mut posts, &b"[]"[..], &context());
    assert_eq!(errors.into_vec(), vec![FieldError::input_not_structure()]);

    let mut slot: Option<Box<Post>> = None;
    let errors = bind_json(&mut slot, &br#"{"title": "Allocated by binder"}"#[..], &context());
    assert!(errors.is_empty());
    assert!(slot.is_some());
}

#[test]
fn serde_skipped_fields_survive_the_decode() {
    let mut draft = OwnedDraft {
        owner: "caller-set".to_string(),
        reviewer: Reviewer {
            name: "Old".to_string(),
            session: "s-1".to_string(),
        },
        backup: Some(Box::new(Reviewer {
            name: String::new(),
            session: "s-2".to_string(),
        })),
        ..OwnedDraft::default()
    };
    let body = br#"{"title": "Hello", "reviewer": {"name": "New"}, "backup": {"name": "Bo"}}"#;
    let errors = bind_json(&mut draft, &body[..], &context());

    assert!(errors.is_empty(), "{errors}");
    assert_eq!(draft.title, "Hello");
    assert_eq!(draft.owner, "caller-set");
    assert_eq!(draft.reviewer.name, "New");
    assert_eq!(draft.reviewer.session, "s-1");
    assert_eq!(
        draft.backup.as_deref().map(|backup| (backup.name.as_str(), backup.session.as_str())),
        Some(("Bo", "s-2"))
    );
}

#[test]
fn file_fields_are_untouched_by_json() {
    let image = FileRef::new(FilePart::in_memory("cover.png", None, b"png".to_vec()));
    let mut blog = BlogPost::default();
    blog.ignored = "kept".to_string();
    blog.header_image = Some(image.clone());

    let errors = bind_json(
        &mut blog,
        &br#"{"title": "Files stay put", "id": 4, "author": {"name": "Ann"}}"#[..],
        &context(),
    );
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(blog.id, 4);
    assert_eq!(blog.ignored, "kept");
    assert_eq!(blog.header_image, Some(image));
}

#[test]
fn null_document_binds_nothing() {
    let mut draft = OwnedDraft {
        title: "Existing".to_string(),
        owner: "caller-set".to_string(),
        ..OwnedDraft::default()
    };
    let errors = bind_json(&mut draft, &b" null "[..], &context());
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(draft.title, "Existing");
    assert_eq!(draft.owner, "caller-set");
}

#[test]
fn rejected_document_leaves_the_record_alone() {
    let mut draft = OwnedDraft {
        title: "Existing".to_string(),
        owner: "caller-set".to_string(),
        ..OwnedDraft::default()
    };
    let errors = bind_json(&mut draft, &br#"{"title": 7}"#[..], &context());
    assert_eq!(summary(&errors), expected(&[("", "DeserializationError")]));
    assert_eq!(draft.title, "Existing");
    assert_eq!(draft.owner, "caller-set");
}
