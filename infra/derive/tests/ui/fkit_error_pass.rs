use fkit_derive::fkit_error;
use std::borrow::Cow;

#[fkit_error]
pub enum LoadError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Missing variable{}: {key}", format_context(.context))]
    Missing { key: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<String, LoadError> {
    let raw = std::fs::read_to_string("/definitely/not/here").context("Reading variables")?;
    Ok(raw)
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.context_message(), Some("Reading variables"));

    let missing: Result<(), LoadError> =
        Err(LoadError::Missing { key: "punctuation-enabled".into(), context: None });
    let missing = missing.context("settings").unwrap_err();
    assert_eq!(missing.to_string(), "Missing variable (settings): punctuation-enabled");

    let internal = LoadError::from("boom");
    assert!(internal.context_message().is_none());
}
