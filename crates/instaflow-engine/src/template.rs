use instaflow_core::config::UnresolvedTokens;
use instaflow_core::types::Variables;

/// Replace `{name}` tokens with the matching variable.
///
/// Tokens naming an unknown variable are kept or blanked per `policy`.
/// A `{` without a closing `}` is copied through as-is.
pub fn substitute(text: &str, variables: &Variables, policy: UnresolvedTokens) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        if is_token_name(name) {
            match (variables.get(name), policy) {
                (Some(value), _) => out.push_str(value),
                (None, UnresolvedTokens::Keep) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                (None, UnresolvedTokens::Empty) => {}
            }
            rest = &after[close + 1..];
        } else {
            // Not a token (e.g. JSON text); emit the brace and rescan after it.
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn is_token_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        [("username", "bob"), ("comment_id", "c1")].into_iter().collect()
    }

    #[test]
    fn replaces_known_tokens() {
        assert_eq!(substitute("Hi {username}!", &vars(), UnresolvedTokens::Keep), "Hi bob!");
        assert_eq!(
            substitute("{username}/{comment_id}/{username}", &vars(), UnresolvedTokens::Keep),
            "bob/c1/bob"
        );
    }

    #[test]
    fn unknown_tokens_follow_policy() {
        assert_eq!(substitute("Hi {first_name}", &vars(), UnresolvedTokens::Keep), "Hi {first_name}");
        assert_eq!(substitute("Hi {first_name}", &vars(), UnresolvedTokens::Empty), "Hi ");
    }

    #[test]
    fn non_token_braces_pass_through() {
        assert_eq!(substitute("{ \"a\": 1 } {username}", &vars(), UnresolvedTokens::Empty), "{ \"a\": 1 } bob");
        assert_eq!(substitute("open { only", &vars(), UnresolvedTokens::Keep), "open { only");
        assert_eq!(substitute("{}", &vars(), UnresolvedTokens::Empty), "{}");
        assert_eq!(substitute("{{username}}", &vars(), UnresolvedTokens::Keep), "{bob}");
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(substitute("no tokens here", &vars(), UnresolvedTokens::Keep), "no tokens here");
    }
}
