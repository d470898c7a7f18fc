//! Serialization of QIR across the external-collaborator boundary (§6.1):
//! `postcard` for the compact wire codec, `serde_json` for human-readable
//! debugging (the CLI demo's output format).

use qir_core::Expr;

/// A serialization failure on either codec path.
#[derive(Debug)]
pub enum WireError {
    Postcard(postcard::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postcard(err) => write!(f, "postcard codec error: {err}"),
            Self::Json(err) => write!(f, "json codec error: {err}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Postcard(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<postcard::Error> for WireError {
    fn from(err: postcard::Error) -> Self {
        Self::Postcard(err)
    }
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Encodes `expr` with the compact wire codec.
pub fn to_postcard(expr: &Expr) -> Result<Vec<u8>, WireError> {
    Ok(postcard::to_allocvec(expr)?)
}

/// Decodes a QIR expression previously written by [`to_postcard`].
pub fn from_postcard(bytes: &[u8]) -> Result<Expr, WireError> {
    Ok(postcard::from_bytes(bytes)?)
}

/// Encodes `expr` as human-readable JSON.
pub fn to_json(expr: &Expr) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(expr)?)
}

/// Decodes a QIR expression previously written by [`to_json`].
pub fn from_json(text: &str) -> Result<Expr, WireError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qir_core::Scalar;

    use super::*;

    fn sample() -> Expr {
        Expr::select(
            Expr::scan("employees"),
            Expr::Lambda {
                param: "e".to_owned(),
                body: Box::new(Expr::Reference { source: "e".to_owned(), field: "active".to_owned() }),
            },
        )
        .unwrap()
    }

    #[test]
    fn postcard_round_trips() {
        let expr = sample();
        let bytes = to_postcard(&expr).unwrap();
        assert_eq!(from_postcard(&bytes).unwrap(), expr);
    }

    #[test]
    fn json_round_trips() {
        let expr = sample();
        let text = to_json(&expr).unwrap();
        assert_eq!(from_json(&text).unwrap(), expr);
    }

    #[test]
    fn malformed_postcard_bytes_fail_cleanly() {
        assert!(from_postcard(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn value_scalars_survive_both_codecs() {
        let expr = Expr::Value(Scalar::Double(1.5));
        assert_eq!(from_postcard(&to_postcard(&expr).unwrap()).unwrap(), expr);
        assert_eq!(from_json(&to_json(&expr).unwrap()).unwrap(), expr);
    }
}
