use regex::Regex;

use crate::error::FuzzError;
use crate::payload::{Encoder, EncoderChain};

/// One parsed `-e` occurrence: a bare name (or `=PARAM`/`@REGEX` decorated
/// name) becomes a standalone default-set encoder; a comma-separated list
/// becomes a sequential chain.
pub enum EncoderSpec {
    Single(Encoder),
    Chain(EncoderChain),
}

/// Parses one `-e` value: `NAME[=PARAM][@REGEX]` tokens separated by `,`.
/// A single token yields `Single`; two or more yield a `Chain` applying the
/// tokens in the order given. `=PARAM` is accepted for forward
/// compatibility with parameterized plugins but none of the shipped
/// encoders take one, so it is parsed and discarded.
pub fn parse_encoder_spec(raw: &str) -> Result<EncoderSpec, FuzzError> {
    let tokens: Vec<Encoder> = raw
        .split(',')
        .map(parse_one_token)
        .collect::<Result<_, _>>()?;

    match tokens.len() {
        0 => Err(FuzzError::Config("empty encoder spec".to_string())),
        1 => Ok(EncoderSpec::Single(tokens.into_iter().next().unwrap())),
        _ => Ok(EncoderSpec::Chain(EncoderChain(tokens))),
    }
}

fn parse_one_token(token: &str) -> Result<Encoder, FuzzError> {
    let token = token.trim();
    let (name_and_param, scope) = match token.split_once('@') {
        Some((left, pattern)) => (left, Some(pattern)),
        None => (token, None),
    };
    let name = name_and_param.split_once('=').map(|(n, _)| n).unwrap_or(name_and_param);

    match scope {
        None => Ok(Encoder::new(name)),
        Some(pattern) => {
            let re = Regex::new(pattern)
                .map_err(|e| FuzzError::Config(format!("invalid encoder scope regex '{pattern}': {e}")))?;
            Ok(Encoder::scoped(name, re))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_is_single() {
        match parse_encoder_spec("base64").unwrap() {
            EncoderSpec::Single(enc) => assert_eq!(enc.name, "base64"),
            _ => panic!("expected single"),
        }
    }

    #[test]
    fn comma_list_is_chain() {
        match parse_encoder_spec("base64,url").unwrap() {
            EncoderSpec::Chain(chain) => assert_eq!(chain.0.len(), 2),
            _ => panic!("expected chain"),
        }
    }

    #[test]
    fn at_suffix_scopes_the_encoder() {
        match parse_encoder_spec(r"hex@\d+").unwrap() {
            EncoderSpec::Single(enc) => assert!(enc.scope.is_some()),
            _ => panic!("expected single"),
        }
    }

    #[test]
    fn param_is_parsed_and_discarded() {
        match parse_encoder_spec("base64=ignored").unwrap() {
            EncoderSpec::Single(enc) => assert_eq!(enc.name, "base64"),
            _ => panic!("expected single"),
        }
    }
}
