use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::FuzzError;
use crate::target::Target;

/// The three ways a `-w` argument can resolve to a raw wordlist, mirroring
/// the CLI surface: a literal inline list in brackets, a plugin reference
/// (`name=param`) whose special metavars substitute the current target's
/// host or pure URL when no parameter is given, or a file path.
#[derive(Debug, Clone)]
pub enum WordlistSource {
    Inline(Vec<String>),
    Plugin { name: String, param: Option<String> },
    File(String),
}

impl WordlistSource {
    /// Parses one `-w` value. `[a,b,c]` is an inline literal list;
    /// `name=param` with a name resolvable in the plugin registry is a
    /// plugin reference; anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return WordlistSource::Inline(inner.split(',').map(str::to_string).collect());
        }
        if let Some((name, param)) = raw.split_once('=') {
            if is_known_plugin(name) {
                return WordlistSource::Plugin {
                    name: name.to_string(),
                    param: if param.is_empty() { None } else { Some(param.to_string()) },
                };
            }
        }
        if is_known_plugin(raw) {
            return WordlistSource::Plugin { name: raw.to_string(), param: None };
        }
        WordlistSource::File(raw.to_string())
    }
}

fn is_known_plugin(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "robots" | "dns")
}

/// Loads the raw words for one source. `target` supplies the values for
/// the `TARGET_HOST`/`TARGET_URL` plugin metavars when a plugin is invoked
/// without an explicit parameter.
pub async fn load(source: &WordlistSource, target: &Target) -> Result<Vec<String>, FuzzError> {
    match source {
        WordlistSource::Inline(words) => Ok(words.clone()),
        WordlistSource::File(path) => load_file(path).await,
        WordlistSource::Plugin { name, param } => load_plugin(name, param.as_deref(), target),
    }
}

async fn load_file(path: &str) -> Result<Vec<String>, FuzzError> {
    let file = File::open(path).await.map_err(FuzzError::Io)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();
    let mut words = Vec::new();
    while let Some(line) = lines.next_line().await.map_err(FuzzError::Io)? {
        if !line.trim().is_empty() {
            words.push(line.trim().to_string());
        }
    }
    Ok(words)
}

/// Built-in plugin wordlists. `robots` and `dns` are placeholders that
/// demonstrate the TARGET_HOST/TARGET_URL substitution rule; real
/// deployments register richer plugins through the same registry.
fn load_plugin(name: &str, param: Option<&str>, target: &Target) -> Result<Vec<String>, FuzzError> {
    let resolved_param = param
        .map(str::to_string)
        .unwrap_or_else(|| target.pure_url());

    match name.to_lowercase().as_str() {
        "robots" => Ok(vec![format!("{resolved_param}/robots.txt"), "sitemap.xml".to_string()]),
        "dns" => {
            let host = target.host().unwrap_or_default();
            Ok(vec!["www".to_string(), "mail".to_string(), "api".to_string(), host])
        }
        other => Err(FuzzError::UnknownPlugin {
            name: other.to_string(),
            available: "robots, dns".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_bracket_list() {
        let src = WordlistSource::parse("[a,b,c]");
        match src {
            WordlistSource::Inline(words) => assert_eq!(words, vec!["a", "b", "c"]),
            _ => panic!("expected inline"),
        }
    }

    #[test]
    fn parses_plugin_reference() {
        let src = WordlistSource::parse("robots=http://example.com");
        match src {
            WordlistSource::Plugin { name, param } => {
                assert_eq!(name, "robots");
                assert_eq!(param.as_deref(), Some("http://example.com"));
            }
            _ => panic!("expected plugin"),
        }
    }

    #[test]
    fn falls_back_to_file_path() {
        let src = WordlistSource::parse("/tmp/words.txt");
        assert!(matches!(src, WordlistSource::File(_)));
    }

    #[tokio::test]
    async fn plugin_substitutes_target_url_when_param_absent() {
        let target = Target::new("http://example.com/$");
        let words = load_plugin("robots", None, &target).unwrap();
        assert!(words[0].contains("example.com"));
    }
}
