//! `uri_for` support for minijinja template environments.
//!
//! Templates build links back into the application without hardcoding
//! URLs:
//!
//! ```jinja
//! <a href="{{ uri_for('/user', user_id, 'profile') }}">profile</a>
//! <a href="{{ uri_for('/pets', 'QUERY', 'tab=info', 'sort=name') }}">pets</a>
//! ```
//!
//! Arguments before the literal `QUERY` marker are appended to the path as
//! encoded segments; arguments after it are `key=value` query pairs, split
//! on the first `=`. The output is fully encoded.

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind};

/// Build a fully-encoded URI from a base URL, a path, positional path
/// arguments, and query pairs.
///
/// Path segments are appended individually so each one is percent-encoded;
/// query pairs go through the standard form encoding.
#[must_use]
pub fn uri_for(
    base: &url::Url,
    path: &str,
    args: &[String],
    query: &[(String, String)],
) -> url::Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            segments.push(segment);
        }
        for arg in args {
            segments.push(arg);
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    url
}

/// Split a `key=value` expression on the first `=`.
///
/// A missing `=` yields the whole input as the key with an empty value.
#[must_use]
pub fn split_query(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Register the `uri_for` function on a template environment, rooted at
/// the given public base URL.
pub fn register_uri_for(env: &mut Environment<'static>, base: url::Url) {
    env.add_function("uri_for", move |values: Rest<Value>| -> Result<String, Error> {
        if values.is_empty() {
            return Err(Error::new(
                ErrorKind::MissingArgument,
                "uri_for requires at least the path",
            ));
        }
        let path = values[0].to_string();

        let mut args = Vec::new();
        let mut query = Vec::new();
        let mut in_query = false;
        for value in &values[1..] {
            if value.as_str() == Some("QUERY") {
                in_query = true;
                continue;
            }
            if in_query {
                query.push(split_query(&value.to_string()));
            } else {
                args.push(value.to_string());
            }
        }

        Ok(uri_for(&base, &path, &args, &query).to_string())
    });
}

/// A template environment with the `uri_for` function pre-registered.
#[must_use]
pub fn environment(base: url::Url) -> Environment<'static> {
    let mut env = Environment::new();
    register_uri_for(&mut env, base);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn base() -> url::Url {
        url::Url::parse("http://example.com/").unwrap()
    }

    #[test]
    fn joins_path_and_args() {
        let url = uri_for(&base(), "/user", &["42".into(), "profile".into()], &[]);
        assert_eq!(url.as_str(), "http://example.com/user/42/profile");
    }

    #[test]
    fn encodes_segments_and_query() {
        let url = uri_for(
            &base(),
            "/search",
            &["a b".into()],
            &[("q".into(), "x&y".into())],
        );
        assert_eq!(url.as_str(), "http://example.com/search/a%20b?q=x%26y");
    }

    #[test]
    fn split_query_takes_first_equals() {
        assert_eq!(split_query("a=b=c"), ("a".into(), "b=c".into()));
        assert_eq!(split_query("bare"), ("bare".into(), String::new()));
    }

    #[test]
    fn template_function_renders() {
        let mut env = environment(base());
        env.add_template("t", "{{ uri_for('/pets', id, 'QUERY', 'tab=info', 'tab=stats') }}")
            .unwrap();
        let out = env.get_template("t").unwrap().render(context! { id => 42 }).unwrap();
        assert_eq!(out, "http://example.com/pets/42?tab=info&tab=stats");
    }

    #[test]
    fn template_function_requires_path() {
        let mut env = environment(base());
        env.add_template("t", "{{ uri_for() }}").unwrap();
        assert!(env.get_template("t").unwrap().render(context! {}).is_err());
    }
}
