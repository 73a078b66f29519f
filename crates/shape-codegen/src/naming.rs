//! Identifier casing and reserved-word escaping for generated Rust.

/// Convert `TranscriptEvent` / `transcriptEvent` / `IDPCommunicationError` to snake case.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Convert `bad_request` / `badRequest` / `BadRequest` to `BadRequest`.
pub fn to_pascal_case(name: &str) -> String {
    to_snake_case(name)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Make `name` usable as a Rust identifier.
///
/// Keywords become raw identifiers (`type` -> `r#type`). The four keywords that cannot
/// be raw (`self`, `Self`, `crate`, `super`) get a trailing underscore instead.
pub fn escape_if_needed(name: &str) -> String {
    match name {
        "self" | "Self" | "crate" | "super" => format!("{name}_"),
        _ if syn::parse_str::<syn::Ident>(name).is_ok() => name.to_string(),
        _ if syn::parse_str::<syn::Ident>(&format!("r#{name}")).is_ok() => format!("r#{name}"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("TranscriptEvent"), "transcript_event");
        assert_eq!(to_snake_case("transcriptEvent"), "transcript_event");
        assert_eq!(to_snake_case("IDPCommunicationError"), "idp_communication_error");
        assert_eq!(to_snake_case("Ec2Instance"), "ec2_instance");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("GetHTTP"), "get_http");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("bad_request"), "BadRequest");
        assert_eq!(to_pascal_case("transcript"), "Transcript");
        assert_eq!(to_pascal_case("BadRequestException"), "BadRequestException");
        assert_eq!(to_pascal_case("awsJson1_1"), "AwsJson11");
    }

    #[test]
    fn test_escape_keywords() {
        assert_eq!(escape_if_needed("type"), "r#type");
        assert_eq!(escape_if_needed("match"), "r#match");
        assert_eq!(escape_if_needed("self"), "self_");
        assert_eq!(escape_if_needed("Self"), "Self_");
        assert_eq!(escape_if_needed("name"), "name");
    }
}
