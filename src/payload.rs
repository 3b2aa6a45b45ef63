use regex::Regex;

/// At most one case transform may be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFold {
    #[default]
    None,
    Lower,
    Upper,
    Capitalize,
}

fn apply_case(word: &str, fold: CaseFold) -> String {
    match fold {
        CaseFold::None => word.to_string(),
        CaseFold::Lower => word.to_lowercase(),
        CaseFold::Upper => word.to_uppercase(),
        CaseFold::Capitalize => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

/// A single named encoding step, optionally scoped to substrings matching a
/// regex (the rest of the payload passes through unchanged).
#[derive(Debug, Clone)]
pub struct Encoder {
    pub name: String,
    pub scope: Option<Regex>,
}

impl Encoder {
    pub fn new(name: impl Into<String>) -> Self {
        Encoder { name: name.into(), scope: None }
    }

    pub fn scoped(name: impl Into<String>, scope: Regex) -> Self {
        Encoder { name: name.into(), scope: Some(scope) }
    }

    pub fn apply(&self, input: &str) -> Result<String, crate::error::FuzzError> {
        let encode_one = |s: &str| encode_by_name(&self.name, s);
        match &self.scope {
            None => encode_one(input),
            Some(re) => {
                let mut out = String::with_capacity(input.len());
                let mut last = 0;
                for m in re.find_iter(input) {
                    out.push_str(&input[last..m.start()]);
                    out.push_str(&encode_one(m.as_str())?);
                    last = m.end();
                }
                out.push_str(&input[last..]);
                Ok(out)
            }
        }
    }
}

fn encode_by_name(name: &str, s: &str) -> Result<String, crate::error::FuzzError> {
    use base64::Engine as _;
    match name.to_lowercase().as_str() {
        "base64" | "b64" => Ok(base64::engine::general_purpose::STANDARD.encode(s.as_bytes())),
        "url" | "urlencode" => Ok(urlencoding::encode(s).into_owned()),
        "hex" => Ok(hex::encode(s.as_bytes())),
        "html" => Ok(html_escape(s)),
        other => Err(crate::error::FuzzError::UnknownPlugin {
            name: other.to_string(),
            available: "base64, url, hex, html".to_string(),
        }),
    }
}

fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

/// A sequential composition of encoders: applied in order, producing one
/// final payload per chain.
#[derive(Debug, Clone, Default)]
pub struct EncoderChain(pub Vec<Encoder>);

impl EncoderChain {
    pub fn apply(&self, input: &str) -> Result<String, crate::error::FuzzError> {
        let mut current = input.to_string();
        for encoder in &self.0 {
            current = encoder.apply(&current)?;
        }
        Ok(current)
    }
}

/// Owned by the Dictionary builder (not a process-global singleton): holds
/// prefix/suffix lists, the case fold, the default encoder set, and any
/// encoder chains.
#[derive(Debug, Clone, Default)]
pub struct PayloadTransform {
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    pub case_fold: CaseFold,
    pub default_encoders: Vec<Encoder>,
    pub chains: Vec<EncoderChain>,
}

impl PayloadTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand one raw wordlist entry into its final payloads.
    ///
    /// Yields 1 payload if no encoders are configured, or
    /// `|default_encoders| + |chains|` otherwise. Prefix/suffix apply to the
    /// case-folded word as a cross product before any encoding.
    pub fn expand(&self, raw: &str) -> Result<Vec<String>, crate::error::FuzzError> {
        let cased = apply_case(raw, self.case_fold);

        let prefixes: Vec<&str> = if self.prefixes.is_empty() {
            vec![""]
        } else {
            self.prefixes.iter().map(String::as_str).collect()
        };
        let suffixes: Vec<&str> = if self.suffixes.is_empty() {
            vec![""]
        } else {
            self.suffixes.iter().map(String::as_str).collect()
        };

        let mut wrapped = Vec::with_capacity(prefixes.len() * suffixes.len());
        for p in &prefixes {
            for s in &suffixes {
                wrapped.push(format!("{p}{cased}{s}"));
            }
        }

        if self.default_encoders.is_empty() && self.chains.is_empty() {
            return Ok(wrapped);
        }

        let mut out = Vec::new();
        for w in &wrapped {
            for enc in &self.default_encoders {
                out.push(enc.apply(w)?);
            }
            for chain in &self.chains {
                out.push(chain.apply(w)?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_equals_raw() {
        let t = PayloadTransform::new();
        assert_eq!(t.expand("admin").unwrap(), vec!["admin".to_string()]);
    }

    #[test]
    fn prefix_suffix_cross_product() {
        let mut t = PayloadTransform::new();
        t.prefixes = vec!["a".into(), "b".into()];
        t.suffixes = vec!["1".into(), "2".into()];
        let out = t.expand("x").unwrap();
        assert_eq!(out, vec!["ax1", "ax2", "bx1", "bx2"]);
    }

    #[test]
    fn case_fold_upper() {
        let mut t = PayloadTransform::new();
        t.case_fold = CaseFold::Upper;
        assert_eq!(t.expand("admin").unwrap(), vec!["ADMIN".to_string()]);
    }

    #[test]
    fn default_encoder_set_yields_one_per_encoder() {
        let mut t = PayloadTransform::new();
        t.default_encoders = vec![Encoder::new("base64"), Encoder::new("hex")];
        let out = t.expand("a b").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "YSBi");
        assert_eq!(out[1], "612062");
    }

    #[test]
    fn chain_composes_sequentially() {
        let mut t = PayloadTransform::new();
        t.chains = vec![EncoderChain(vec![Encoder::new("base64"), Encoder::new("url")])];
        let out = t.expand("a b").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], urlencoding::encode("YSBi").into_owned());
    }

    #[test]
    fn unchained_encoders_yield_two_payloads() {
        let mut t = PayloadTransform::new();
        t.default_encoders = vec![Encoder::new("base64"), Encoder::new("url")];
        let out = t.expand("a b").unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn scoped_encoder_only_touches_matches() {
        let re = Regex::new(r"\d+").unwrap();
        let enc = Encoder::scoped("hex", re);
        let out = enc.apply("id=42&name=bob").unwrap();
        assert_eq!(out, "id=3432&name=bob");
    }
}
