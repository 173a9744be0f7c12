//! Pattern compiler.
//!
//! Turns a registered pattern into an anchored regular expression plus the
//! ordered list of parameter names it binds. Each segment is classified on
//! its own:
//!
//! | Segment        | Becomes       | Binds  |
//! |----------------|---------------|--------|
//! | `{name:expr}`  | `(expr)`      | `name` |
//! | `:id`          | `([\d]+)`     | `id`   |
//! | `:name`        | `([\w]+)`     | `name` |
//! | `{name}`       | as `:name`    | `name` |
//! | anything else  | itself, escaped | —    |
//!
//! Each parameter group is named after its position, so groups the user
//! writes inside `expr` never change which text a parameter binds.
//!
//! Only request paths with no literal route in the trie are ever run
//! through a matcher.

use std::collections::HashMap;

use regex::Regex;

const ID_KEY: &str = "id";
const ID_EXPR: &str = r"[\d]+";
const WORD_EXPR: &str = r"[\w]+";

/// Prefix of the group that carries parameter `i`. Groups inside a user
/// expression, named or not, are never read back.
const GROUP_PREFIX: &str = "__trellis_p";

fn group_name(i: usize) -> String {
    format!("{GROUP_PREFIX}{i}")
}

/// Expression for a parameter declared without one.
fn shortcut(name: &str) -> &'static str {
    if name == ID_KEY { ID_EXPR } else { WORD_EXPR }
}

/// A compiled pattern.
#[derive(Debug)]
pub(crate) struct Matcher {
    regex: Regex,
    names: Vec<String>,
}

impl Matcher {
    /// Compiles `pattern`. A leading separator is optional; a trailing one is
    /// significant.
    pub(crate) fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let body = pattern.strip_prefix('/').unwrap_or(pattern);
        let mut names = Vec::new();
        let mut expr = String::from("^");

        for segment in body.split('/').filter(|s| !s.is_empty()) {
            expr.push('/');
            let braced = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'));
            let (name, inner) = match (braced, segment.strip_prefix(':')) {
                (Some(b), _) => match b.split_once(':') {
                    Some((name, inner)) => (name, inner),
                    None => (b, shortcut(b)),
                },
                (None, Some(name)) => (name, shortcut(name)),
                (None, None) => {
                    expr.push_str(&regex::escape(segment));
                    continue;
                }
            };
            expr.push_str(&format!("(?P<{}>{inner})", group_name(names.len())));
            names.push(name.to_owned());
        }

        if body.is_empty() || body.ends_with('/') {
            expr.push('/');
        }
        expr.push('$');

        let regex = Regex::new(&expr)?;
        Ok(Self { regex, names })
    }

    /// Matches the whole of `path`, returning each parameter bound to its
    /// captured text. `None` means no match; there are no partial results.
    pub(crate) fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        if caps.get(0)?.as_str() != path {
            return None;
        }
        let params = self.names.iter()
            .enumerate()
            .map(|(i, name)| {
                let value = caps.name(&group_name(i)).map(|m| m.as_str().to_owned());
                (name.clone(), value.unwrap_or_default())
            })
            .collect();
        Some(params)
    }

    pub(crate) fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
        Matcher::compile(pattern).unwrap().captures(path)
    }

    #[test]
    fn brace_segment_binds_its_expression() {
        let p = params("/users/{id:[0-9]+}", "/users/42").unwrap();
        assert_eq!(p["id"], "42");
        assert_eq!(params("/users/{id:[0-9]+}", "/users/abc"), None);
    }

    #[test]
    fn leading_separator_is_optional() {
        let m = Matcher::compile("users/{id:[0-9]+}").unwrap();
        assert_eq!(m.as_str(), "^/users/(?P<__trellis_p0>[0-9]+)$");
        assert_eq!(m.captures("/users/3").unwrap()["id"], "3");
    }

    #[test]
    fn colon_id_is_numeric() {
        assert_eq!(params("/items/:id", "/items/17").unwrap()["id"], "17");
        assert_eq!(params("/items/:id", "/items/seventeen"), None);
        assert_eq!(
            Matcher::compile("/items/:id").unwrap().as_str(),
            Matcher::compile(r"/items/{id:[\d]+}").unwrap().as_str(),
        );
    }

    #[test]
    fn colon_name_takes_word_characters() {
        assert_eq!(params("/items/:name", "/items/blue_widget").unwrap()["name"], "blue_widget");
        assert_eq!(params("/items/:name", "/items/blue-widget"), None);
    }

    #[test]
    fn several_parameters_bind_in_order() {
        let p = params("/orgs/{org:[a-z]+}/repos/:name/:id", "/orgs/acme/repos/core/9").unwrap();
        assert_eq!(p["org"], "acme");
        assert_eq!(p["name"], "core");
        assert_eq!(p["id"], "9");
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn trailing_separator_is_significant() {
        assert!(params("/docs/:page/", "/docs/intro/").is_some());
        assert!(params("/docs/:page/", "/docs/intro").is_none());
        assert!(params("/docs/:page", "/docs/intro/").is_none());
    }

    #[test]
    fn partial_paths_never_match() {
        assert!(params("/users/:id", "/users/42/extra").is_none());
        assert!(params("/users/:id", "/api/users/42").is_none());
    }

    #[test]
    fn literal_segments_match_literally() {
        assert!(params("/v1.0/:id", "/v1.0/3").is_some());
        assert!(params("/v1.0/:id", "/v1x0/3").is_none());
    }

    #[test]
    fn inner_groups_do_not_shift_bindings() {
        let p = params("/{lang:(en|fr)}/:slug", "/fr/bonjour").unwrap();
        assert_eq!(p["lang"], "fr");
        assert_eq!(p["slug"], "bonjour");
    }

    #[test]
    fn named_inner_groups_do_not_shift_bindings() {
        let p = params("/{lang:(?P<code>en|fr)}/:id", "/fr/42").unwrap();
        assert_eq!(p["lang"], "fr");
        assert_eq!(p["id"], "42");

        let p = params("/{lang:(?<code>en|fr)}/:slug", "/fr/bonjour").unwrap();
        assert_eq!(p["lang"], "fr");
        assert_eq!(p["slug"], "bonjour");

        let p = params("/{v:((a)|(b))(?P<n>[0-9])}/{w:(x)}", "/b7/x").unwrap();
        assert_eq!(p["v"], "b7");
        assert_eq!(p["w"], "x");
    }

    #[test]
    fn bare_brace_segment_uses_the_shortcuts() {
        assert_eq!(params("/users/{id}", "/users/5").unwrap()["id"], "5");
        assert!(params("/users/{id}", "/users/me").is_none());
        assert_eq!(params("/tags/{tag}", "/tags/rust").unwrap()["tag"], "rust");
    }

    #[test]
    fn root_pattern_matches_only_root() {
        assert!(params("/", "/").is_some());
        assert!(params("/", "/x").is_none());
    }

    #[test]
    fn malformed_expression_fails_to_compile() {
        assert!(Matcher::compile("/users/{id:[0-9+}").is_err());
    }
}
