//! Content-type dispatch over `http::Request`.

use crate::content_type::MediaType;
use crate::multipart::{MultipartError, MultipartReader};
use formbind_config::max_memory;
use formbind_core::{
    BindTarget, Errors, FieldError, FormValues, InputBag, MultipartForm, RequestContext,
    bind_bag, bind_json, parse_urlencoded,
};
use http::{Method, Request, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Largest urlencoded body that is parsed.
pub const MAX_FORM_BODY: usize = 10 << 20;

/// Bind a request of any supported content type, then validate.
///
/// POST and PUT requests, and any request that declares a content type, are
/// routed by content type: urlencoded forms, multipart forms, or JSON. Any
/// other content type, or none on a POST/PUT, yields a single
/// `ContentTypeError`. Remaining requests bind from the query string.
pub fn bind<'a, T, B>(target: T, request: &Request<B>) -> Errors
where
    T: BindTarget<'a>,
    T::Record: Serialize + DeserializeOwned,
    B: AsRef<[u8]>,
{
    let content_type = content_type(request);
    let method = request.method();
    if *method != Method::POST && *method != Method::PUT && content_type.is_empty() {
        debug!(target: "formbind::dispatch", path = "query", "dispatching request");
        return form(target, request);
    }

    if content_type.contains("form-urlencoded") {
        debug!(target: "formbind::dispatch", path = "form", "dispatching request");
        form(target, request)
    } else if content_type.contains("multipart/form-data") {
        debug!(target: "formbind::dispatch", path = "multipart", "dispatching request");
        multipart_form(target, request)
    } else if content_type.contains("json") {
        debug!(target: "formbind::dispatch", path = "json", "dispatching request");
        json(target, request)
    } else if content_type.is_empty() {
        debug!(target: "formbind::dispatch", method = %method, "missing content type");
        Errors::from(FieldError::empty_content_type())
    } else {
        debug!(
            target: "formbind::dispatch",
            content_type = %content_type,
            "unsupported content type"
        );
        Errors::from(FieldError::unsupported_content_type())
    }
}

/// Bind urlencoded body values and query string values, then validate.
///
/// The body is read only for POST, PUT, and PATCH requests declaring
/// `application/x-www-form-urlencoded`. Body values come before query values
/// for the same key. A malformed payload adds one `DeserializationError` and
/// binding continues with whatever decoded cleanly.
pub fn form<'a, T, B>(target: T, request: &Request<B>) -> Errors
where
    T: BindTarget<'a>,
    B: AsRef<[u8]>,
{
    let context = RequestContext::from_request(request);
    let (values, prior) = request_values(request);
    bind_bag(target, &InputBag::new(&values), prior, &context)
}

/// Bind a multipart body, then validate.
///
/// A [`MultipartForm`] already stored in the request extensions is used as
/// is. Otherwise the body is parsed here, keeping at most
/// [`formbind_config::max_memory`] bytes of file content in memory.
pub fn multipart_form<'a, T, B>(target: T, request: &Request<B>) -> Errors
where
    T: BindTarget<'a>,
    B: AsRef<[u8]>,
{
    let context = RequestContext::from_request(request);
    if let Some(form) = request.extensions().get::<MultipartForm>() {
        return bind_bag(target, &form.bag(), Errors::new(), &context);
    }

    let mut prior = Errors::new();
    let form = read_multipart(request).unwrap_or_else(|error| {
        warn!(target: "formbind::multipart", error = %error, "multipart body rejected");
        prior.push(FieldError::deserialization(error.to_string()));
        MultipartForm::default()
    });
    bind_bag(target, &form.bag(), prior, &context)
}

/// Bind a JSON body, then validate.
///
/// An empty body binds nothing and is not an error.
pub fn json<'a, T, B>(target: T, request: &Request<B>) -> Errors
where
    T: BindTarget<'a>,
    T::Record: Serialize + DeserializeOwned,
    B: AsRef<[u8]>,
{
    let context = RequestContext::from_request(request);
    let body: &[u8] = request.body().as_ref();
    bind_json(target, body, &context)
}

/// Parse a multipart request body with the process-wide memory budget.
pub fn read_multipart<B: AsRef<[u8]>>(
    request: &Request<B>,
) -> Result<MultipartForm, MultipartError> {
    let body: &[u8] = request.body().as_ref();
    MultipartReader::from_content_type(body, &content_type(request))?.read_form(max_memory())
}

fn request_values<B: AsRef<[u8]>>(request: &Request<B>) -> (FormValues, Errors) {
    let mut values = FormValues::new();
    let mut first_error: Option<String> = None;

    if reads_form_body(request) {
        let body: &[u8] = request.body().as_ref();
        if body.len() > MAX_FORM_BODY {
            first_error = Some("http: POST too large".to_string());
        } else if let Err(error) = parse_urlencoded(body, &mut values) {
            first_error = Some(error.to_string());
        }
    }

    if let Some(query) = request.uri().query() {
        let mut query_values = FormValues::new();
        match parse_urlencoded(query.as_bytes(), &mut query_values) {
            Ok(()) => {
                for (key, mut entries) in query_values {
                    values.entry(key).or_default().append(&mut entries);
                }
            },
            Err(error) => {
                first_error.get_or_insert_with(|| error.to_string());
            },
        }
    }

    let mut prior = Errors::new();
    if let Some(message) = first_error {
        warn!(target: "formbind::form", error = %message, "form payload rejected");
        prior.push(FieldError::deserialization(message));
    }
    (values, prior)
}

fn reads_form_body<B>(request: &Request<B>) -> bool {
    let method = request.method();
    if *method != Method::POST && *method != Method::PUT && *method != Method::PATCH {
        return false;
    }
    MediaType::parse(&content_type(request))
        .is_some_and(|media| media.essence() == "application/x-www-form-urlencoded")
}

fn content_type<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default()
}
