//! Content-type dispatch over complete requests.

use formbind_core::{FilePart, FileRef, MultipartForm};
use formbind_facade::{
    Classification, Errors, FieldError, Record, RequestContext, ValidateHook, bind, form, json,
};
use http::{Request, header};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Record)]
#[binding(hook)]
struct Comment {
    #[form("author")]
    #[binding(required, alpha_dash)]
    pub author: String,
    #[form("body")]
    #[binding(min_size = 3)]
    pub body: String,
    #[form("score")]
    pub scores: Vec<u8>,
    #[form("attachment")]
    #[serde(skip)]
    pub attachment: Option<FileRef>,
}

impl ValidateHook for Comment {
    fn validate_extra(&self, context: &RequestContext, mut errors: Errors) -> Errors {
        if context.header("x-read-only").is_some() {
            errors.push(FieldError::global(
                Classification::custom("ReadOnlyError"),
                "writes are disabled",
            ));
        }
        errors
    }
}

fn classes(errors: &Errors) -> Vec<&str> {
    errors.iter().map(|error| error.kind().as_str()).collect()
}

const BOUNDARY: &str = "formbind-boundary";

fn multipart_body() -> String {
    [
        "--formbind-boundary",
        "Content-Disposition: form-data; name=\"author\"",
        "",
        "ann_lee",
        "--formbind-boundary",
        "Content-Disposition: form-data; name=\"body\"",
        "",
        "Looks good",
        "--formbind-boundary",
        "Content-Disposition: form-data; name=\"attachment\"; filename=\"diff.patch\"",
        "Content-Type: text/x-diff",
        "",
        "+ added line",
        "--formbind-boundary--",
        "",
    ]
    .join("\r\n")
}

#[test]
fn urlencoded_post_binds_body_then_query() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments?score=9")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
        .body("author=ann_lee&body=Nice+work&score=7")?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert!(errors.is_empty(), "{errors}");
    assert_eq!(comment.author, "ann_lee");
    assert_eq!(comment.body, "Nice work");
    assert_eq!(comment.scores, vec![7, 9]);
    Ok(())
}

#[test]
fn bodiless_get_binds_query_string() -> Result<(), Box<dyn Error>> {
    let request = Request::get("/comments?author=bob&body=hey").body(Vec::<u8>::new())?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert!(errors.is_empty(), "{errors}");
    assert_eq!(comment.author, "bob");
    Ok(())
}

#[test]
fn post_without_content_type_is_rejected() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments?author=bob").body("")?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert_eq!(errors.into_vec(), vec![FieldError::empty_content_type()]);
    assert_eq!(comment, Comment::default());
    Ok(())
}

#[test]
fn unknown_content_type_is_rejected() -> Result<(), Box<dyn Error>> {
    let request = Request::get("/comments")
        .header(header::CONTENT_TYPE, "text/csv")
        .body("author,body")?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert_eq!(errors.len(), 1);
    assert!(errors.iter().all(|error| error.message() == "Unsupported Content-Type"));
    Ok(())
}

#[test]
fn json_body_is_decoded_and_validated() -> Result<(), Box<dyn Error>> {
    let request = Request::put("/comments/1")
        .header(header::CONTENT_TYPE, "application/vnd.api+json")
        .body(r#"{"author": "ann lee", "body": "ok", "scores": [1, 2]}"#)?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert_eq!(classes(&errors), vec!["AlphaDashError", "MinSizeError"]);
    assert_eq!(comment.scores, vec![1, 2]);
    Ok(())
}

#[test]
fn empty_json_body_only_validates() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Vec::<u8>::new())?;
    let mut comment = Comment::default();
    let errors = json(&mut comment, &request);

    assert_eq!(classes(&errors), vec!["RequiredError", "MinSizeError"]);
    Ok(())
}

#[test]
fn malformed_json_is_reported_before_validation() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments")
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{"author": "#)?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert_eq!(
        classes(&errors),
        vec!["DeserializationError", "RequiredError", "MinSizeError"]
    );
    Ok(())
}

#[test]
fn malformed_urlencoded_body_still_binds_query() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments?author=bob&body=fine")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("body=%zz")?;
    let mut comment = Comment::default();
    let errors = form(&mut comment, &request);

    assert_eq!(classes(&errors), vec!["DeserializationError"]);
    assert_eq!(comment.author, "bob");
    assert_eq!(comment.body, "fine");
    Ok(())
}

#[test]
fn multipart_body_binds_values_and_files() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body())?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert!(errors.is_empty(), "{errors}");
    assert_eq!(comment.author, "ann_lee");
    assert_eq!(comment.body, "Looks good");
    let Some(attachment) = comment.attachment else {
        return Err("attachment missing".into());
    };
    assert_eq!(attachment.filename(), "diff.patch");
    assert_eq!(attachment.content_type(), Some("text/x-diff"));
    assert_eq!(attachment.read_to_vec()?, b"+ added line");
    Ok(())
}

#[test]
fn parsed_multipart_form_in_extensions_is_used() -> Result<(), Box<dyn Error>> {
    let mut parsed = MultipartForm::default();
    parsed.push_value("author", "from_extensions");
    parsed.push_value("body", "already parsed");
    parsed.push_file(
        "attachment",
        FileRef::new(FilePart::in_memory("a.txt", None, b"a".to_vec())),
    );

    let mut request = Request::post("/comments")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=unused")
        .body("not a multipart body")?;
    request.extensions_mut().insert(parsed);

    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert!(errors.is_empty(), "{errors}");
    assert_eq!(comment.author, "from_extensions");
    assert!(comment.attachment.is_some());
    Ok(())
}

#[test]
fn multipart_without_boundary_is_a_deserialization_error() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments")
        .header(header::CONTENT_TYPE, "multipart/form-data")
        .body(multipart_body())?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert_eq!(
        classes(&errors),
        vec!["DeserializationError", "RequiredError", "MinSizeError"]
    );
    assert!(
        errors
            .iter()
            .any(|error| error.message() == "no multipart boundary param in Content-Type")
    );
    Ok(())
}

#[test]
fn hook_sees_request_headers() -> Result<(), Box<dyn Error>> {
    let request = Request::post("/comments")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-read-only", "1")
        .body("author=ann&body=fine")?;
    let mut comment = Comment::default();
    let errors = bind(&mut comment, &request);

    assert_eq!(classes(&errors), vec!["ReadOnlyError"]);
    Ok(())
}

#[test]
fn sequence_targets_are_rejected() -> Result<(), Box<dyn Error>> {
    let request = Request::get("/comments?author=bob").body(Vec::<u8>::new())?;
    let mut comments: Vec<Comment> = Vec::new();
    let errors = bind(&mut comments, &request);

    assert_eq!(errors.into_vec(), vec![FieldError::input_not_structure()]);
    Ok(())
}
