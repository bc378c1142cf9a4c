use http::Method;
use signpost::{Matcher, Params, RouteEntry, RouteTable, Target, Value};

macro_rules! match_tests {
    ($($name:ident {
        routes = $routes:expr,
        $( $path:literal :: $route:literal =>
            $( $(@$none:tt)? None )?
            $( $(@$some:tt)? { $( $key:literal => $val:literal ),* $(,)? } )?
        ),* $(,)?
    }),* $(,)?) => { $(
        #[test]
        fn $name() {
            let mut table = RouteTable::new();

            for route in $routes {
                let entry = RouteEntry::new(route, &[Method::GET], route, Target::new("Handler", route));
                table.register(entry).unwrap();
            }

            let matcher = Matcher::new(&table);

            $(
                let result = matcher.lookup(&Method::GET, $path, &Params::new());
                match result.data {
                    None => {
                        $($( @$some )?
                            panic!("expected '{}' to match '{}'", $path, $route)
                        )?
                    }
                    Some(entry) => {
                        $($( @$some )?
                            if entry.pattern != $route {
                                panic!(
                                    "wrong route for '{}': expected '{}', found '{}'",
                                    $path, $route, entry.pattern
                                );
                            }

                            let expected: Params = Vec::<(&str, &str)>::from([$(($key, $val)),*])
                                .into_iter()
                                .collect();
                            assert_eq!(result.params, expected, "wrong params for '{}'", $path);
                        )?

                        $($( @$none )?
                            panic!("unexpected match for '{}': '{}'", $path, entry.pattern);
                        )?
                    }
                }
            )*
        }
   )* };
}

match_tests! {
    literal_beats_parameter {
        routes = ["/test", "/test/:id"],
        "/test" :: "/test" => {},
        "/test/42" :: "/test/:id" => { "id" => "42" },
        "/test/42/7" :: "/test/:id" => None,
    },
    longest_pattern_wins {
        routes = ["/test", "/test[/:id]"],
        "/test/10" :: "/test[/:id]" => { "id" => "10" },
        // the optional pattern is longer, so it also takes the bare path
        "/test" :: "/test[/:id]" => {},
    },
    nested_optionals {
        routes = ["/test[/:id[/:offset]]"],
        "/test/123/10" :: "/test[/:id[/:offset]]" => { "id" => "123", "offset" => "10" },
        "/test/123" :: "/test[/:id[/:offset]]" => { "id" => "123" },
        "/test" :: "/test[/:id[/:offset]]" => {},
        "/test/123/10/9" :: "/test[/:id[/:offset]]" => None,
        "/tes" :: "/test[/:id[/:offset]]" => None,
    },
    ordered_optionals_reject_gaps {
        routes = ["/docs[/:a[/:b]]"],
        "/docs" :: "/docs[/:a[/:b]]" => {},
        "/docs/1/2" :: "/docs[/:a[/:b]]" => { "a" => "1", "b" => "2" },
        "/docs//2" :: "/docs[/:a[/:b]]" => None,
    },
    escaped_brackets_match_literally {
        routes = ["/files\\[draft\\]"],
        "/files[draft]" :: "/files\\[draft\\]" => {},
        "/files" :: "/files\\[draft\\]" => None,
    },
    multiple_parameters {
        routes = ["/blog/:category/:post"],
        "/blog/rust/routers" :: "/blog/:category/:post" => { "category" => "rust", "post" => "routers" },
        "/blog/rust" :: "/blog/:category/:post" => None,
    },
}

#[test]
fn method_is_part_of_the_key() {
    let mut table = RouteTable::new();
    table
        .register(RouteEntry::new(
            "products",
            &[Method::GET, Method::POST],
            "/products",
            Target::new("ProductController", "index"),
        ))
        .unwrap();

    let matcher = Matcher::new(&table);
    assert!(matcher
        .lookup(&Method::POST, "/products", &Params::new())
        .is_match());
    assert!(!matcher
        .lookup(&Method::DELETE, "/products", &Params::new())
        .is_match());

    assert_eq!(
        table.allowed_methods("/products"),
        vec![Method::GET, Method::POST]
    );
}

#[test]
fn query_constrained_route_is_skipped_entirely() {
    let mut table = RouteTable::new();
    table
        .register(RouteEntry::new(
            "feed",
            &[Method::GET],
            "/feed",
            Target::new("FeedController", "html"),
        ))
        .unwrap();
    table
        .register(RouteEntry::new(
            "feed-rss",
            &[Method::GET],
            "/feed?format=rss",
            Target::new("FeedController", "rss"),
        ))
        .unwrap();

    let matcher = Matcher::new(&table);

    let mut query = Params::new();
    query.set("format", "rss");
    let result = matcher.lookup(&Method::GET, "/feed", &query);
    assert_eq!(result.data.unwrap().alias, "feed-rss");
    assert_eq!(result.params.get("format"), Some(&Value::Str("rss".into())));

    // wrong or missing constraint value: the candidate is skipped, the
    // plain route still matches
    let mut query = Params::new();
    query.set("format", "atom");
    let result = matcher.lookup(&Method::GET, "/feed", &query);
    assert_eq!(result.data.unwrap().alias, "feed");

    let result = matcher.lookup(&Method::GET, "/feed", &Params::new());
    assert_eq!(result.data.unwrap().alias, "feed");
}

#[test]
fn no_match_is_an_empty_result() {
    let table = RouteTable::new();
    let matcher = Matcher::new(&table);

    let result = matcher.lookup(&Method::GET, "/anything", &Params::new());
    assert!(!result.is_match());
    assert!(result.data.is_none());
    assert!(result.params.is_empty());
}

#[test]
fn unregister_removes_every_index() {
    let mut table = RouteTable::new();
    table
        .register(RouteEntry::new(
            "a",
            &[Method::GET],
            "/a/:id",
            Target::new("C", "a"),
        ))
        .unwrap();
    table
        .register(RouteEntry::new(
            "b",
            &[Method::GET],
            "/b/:id",
            Target::new("C", "b"),
        ))
        .unwrap();

    let removed = table.unregister("a").unwrap();
    assert_eq!(removed.alias, "a");
    assert!(table.unregister("a").is_none());

    assert!(table.find_by_alias("a").is_none());
    assert!(table.find_by_target("C", "a").is_none());
    assert!(table.find_by_prefix("a", &Method::GET).is_none());
    assert!(!Matcher::new(&table)
        .lookup(&Method::GET, "/a/1", &Params::new())
        .is_match());

    assert_eq!(table.entries().len(), 1);
    assert_eq!(table.entries()[0].alias, "b");
}

#[test]
fn entries_come_back_in_priority_order() {
    let mut table = RouteTable::new();
    for pattern in ["/a", "/a/:id", "/a/:id/edit"] {
        table
            .register(RouteEntry::new(
                pattern,
                &[Method::GET],
                pattern,
                Target::new("C", pattern),
            ))
            .unwrap();
    }

    let patterns: Vec<&str> = table
        .entries()
        .iter()
        .map(|entry| entry.pattern.as_str())
        .collect();
    assert_eq!(patterns, ["/a/:id/edit", "/a/:id", "/a"]);
}

#[test]
fn registration_rejects_broken_patterns() {
    let mut table = RouteTable::new();
    let entry = RouteEntry::new(
        "broken",
        &[Method::GET],
        "/test[/:id",
        Target::new("C", "broken"),
    );
    assert!(table.register(entry).is_err());
    assert!(table.find_by_alias("broken").is_none());
    assert!(table.entries().is_empty());
}
