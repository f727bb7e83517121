/// Parser option strings: whitespace-separated `key=value` tokens.
///
/// Each parser takes the keys it understands and then calls
/// [`ParserOptions::finish`], which rejects anything left over so a typo
/// never passes silently.
use crate::error::ConfigError;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct ParserOptions {
    entries: BTreeMap<String, String>,
}

impl ParserOptions {
    /// Parse an option string. `None` and blank strings yield no options.
    pub fn parse(option_string: Option<&str>) -> Result<Self, ConfigError> {
        let mut entries = BTreeMap::new();
        for token in option_string.unwrap_or_default().split_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                return Err(ConfigError::MalformedOption {
                    token: token.to_string(),
                });
            };
            if key.is_empty() {
                return Err(ConfigError::MalformedOption {
                    token: token.to_string(),
                });
            }
            if entries.insert(key.to_string(), value.to_string()).is_some() {
                return Err(ConfigError::DuplicateOption {
                    key: key.to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Remove and return the value for `key`.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail if any option was not consumed by `parser`.
    pub fn finish(self, parser: &str) -> Result<(), ConfigError> {
        match self.entries.into_keys().next() {
            Some(key) => Err(ConfigError::UnknownOption {
                parser: parser.to_string(),
                key,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_blank_are_empty() {
        assert!(ParserOptions::parse(None).unwrap().is_empty());
        assert!(ParserOptions::parse(Some("   ")).unwrap().is_empty());
    }

    #[test]
    fn take_consumes_known_keys() {
        let mut opts = ParserOptions::parse(Some("prefix=app  mode=fast")).unwrap();
        assert_eq!(opts.take("prefix").as_deref(), Some("app"));
        assert_eq!(opts.take("prefix"), None);
        assert_eq!(opts.take("mode").as_deref(), Some("fast"));
        assert!(opts.finish("test").is_ok());
    }

    #[test]
    fn value_may_contain_equals() {
        let mut opts = ParserOptions::parse(Some("expr=a=b")).unwrap();
        assert_eq!(opts.take("expr").as_deref(), Some("a=b"));
    }

    #[test]
    fn leftover_key_is_unknown_option() {
        let opts = ParserOptions::parse(Some("prefx=app")).unwrap();
        match opts.finish("keyvalue") {
            Err(ConfigError::UnknownOption { parser, key }) => {
                assert_eq!(parser, "keyvalue");
                assert_eq!(key, "prefx");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn repeated_key_is_rejected() {
        match ParserOptions::parse(Some("prefix=a prefix=b")) {
            Err(ConfigError::DuplicateOption { key }) => assert_eq!(key, "prefix"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn token_without_equals_is_malformed() {
        let err = ParserOptions::parse(Some("verbose")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOption { .. }));
        let err = ParserOptions::parse(Some("=x")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOption { .. }));
    }
}
