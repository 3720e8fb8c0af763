use stubgen::{Config, Expander};

fn expand(source: &str) -> String {
    let expansion = Expander::default()
        .expand(source)
        .expect("expansion should succeed");
    assert!(
        expansion.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        expansion.diagnostics
    );
    expansion.source
}

#[test]
fn throwing_endpoint_in_config_argument_mode() {
    let source = r#"struct Client {
  @Unimplemented
  var endpoint: (String) throws -> Bool
}
"#;
    let expected = r#"struct Client {
  var endpoint: (String) throws -> Bool {
    @storageRestrictions(initializes: _endpoint)
    init(initialValue) {
      let implemented = _$Implemented("endpoint")
      _endpoint = {
        implemented.fulfill()
        return try initialValue($0)
      }
    }
    get {
      _endpoint
    }
    set {
      let implemented = _$Implemented("endpoint")
      _endpoint = {
        implemented.fulfill()
        return try newValue($0)
      }
    }
  }

  private var _endpoint: (String) throws -> Bool = { _ in
    XCTestDynamicOverlay.XCTFail("Unimplemented: 'endpoint'")
    throw XCTestDynamicOverlay.Unimplemented("endpoint")
  }
}
"#;
    assert_eq!(expand(source), expected);
}

#[test]
fn void_endpoint_in_initializer_mode() {
    let source = "@DependencyEndpoint\nvar endpoint: () -> Void\n";
    let expected = r#"var endpoint: () -> Void {
  @storageRestrictions(initializes: $endpoint)
  init(initialValue) {
    let implemented = _$Implemented("endpoint")
    $endpoint = {
      implemented.fulfill()
      initialValue()
    }
  }
  get {
    $endpoint
  }
  set {
    let implemented = _$Implemented("endpoint")
    $endpoint = {
      implemented.fulfill()
      newValue()
    }
  }
}

var $endpoint: () -> Void = {
  XCTestDynamicOverlay.XCTFail("Unimplemented: 'endpoint'")
}
"#;
    assert_eq!(expand(source), expected);
}

#[test]
fn config_default_and_wrapped_types() {
    let source = "@Unimplemented(default: true)\nvar endpoint: (String) -> Bool\n@Unimplemented var load: @Sendable (URL) async throws -> Data\n";
    let output = expand(source);

    assert!(output.contains(
        "private var _endpoint: (String) -> Bool = { _ in\n  XCTestDynamicOverlay.XCTFail(\"Unimplemented: 'endpoint'\")\n  return true\n}"
    ));
    assert!(output.contains("var load: @Sendable (URL) async throws -> Data {"));
    assert!(output.contains("private var _load: @Sendable (URL) async throws -> Data = { _ in"));
    assert!(output.contains("return try await newValue($0)"));
}

#[test]
fn unannotated_and_failing_declarations_are_left_alone() {
    let source = "struct S {\n  var plain: () -> Void\n  @Unimplemented\n  var flag: Bool\n  func f() {}\n}\n";
    let expansion = Expander::default().expand(source).unwrap();
    assert_eq!(expansion.source, source);
    assert!(expansion.artifacts.is_empty());
    assert_eq!(expansion.diagnostics.len(), 1);
}

#[test]
fn retained_attributes_and_modifiers() {
    let source = "@MainActor @DependencyEndpoint public static var ping: () -> Void\n";
    let output = expand(source);
    assert!(output.starts_with("@MainActor public static var ping: () -> Void {\n"));
    assert!(output.contains("\nstatic var $ping: () -> Void = {\n"));
}

#[test]
fn non_closure_initializers_are_forwarded() {
    let source = "@DependencyEndpoint\nvar load: (Int, String) async throws -> Data = liveLoad\n";
    let output = expand(source);
    assert!(output.contains(
        "var $load: (Int, String) async throws -> Data = {\n  XCTestDynamicOverlay.XCTFail(\"Unimplemented: 'load'\")\n  return try await liveLoad($0, $1)\n}"
    ));
}

#[test]
fn closure_initializer_stops_before_the_next_member() {
    let members = [
        "func helper() -> Int { 1 }",
        "init() {}",
        "private func helper() {}",
        "#if DEBUG\n  static let debug = true\n  #endif",
    ];
    for member in members {
        let source = format!(
            "struct Client {{\n  @DependencyEndpoint\n  var endpoint: (String) -> Bool = {{ _ in true }}\n  {member}\n}}\n"
        );
        let expansion = Expander::default().expand(&source).unwrap();
        assert!(expansion.diagnostics.is_empty(), "{member}");
        assert!(
            expansion.source.ends_with(&format!("\n  {member}\n}}\n")),
            "{member} was not kept:\n{}",
            expansion.source
        );
        assert!(expansion.source.contains(
            "  var $endpoint: (String) -> Bool = { _ in\n    XCTestDynamicOverlay.XCTFail(\"Unimplemented: 'endpoint'\")\n    return true\n  }\n"
        ));
    }
}

#[test]
fn chained_initializers_continue_across_lines() {
    let source = "@DependencyEndpoint\nvar load: (Int) -> String = Loader.live\n  .load\nfunc other() {}\n";
    let output = expand(source);
    assert!(output.contains("  return (Loader.live .load)($0)\n}"));
    assert!(output.ends_with("\nfunc other() {}\n"));
}

#[test]
fn expansion_is_idempotent() {
    let source = "struct C {\n  @Unimplemented var a: (Int) -> Void\n  @DependencyEndpoint var b: () async -> Int = { 42 }\n}\n";
    let expander = Expander::default();
    assert_eq!(
        expander.expand(source).unwrap(),
        expander.expand(source).unwrap()
    );
}

#[test]
fn parallel_matches_sequential() {
    let mut source = String::from("struct Many {\n");
    for n in 0..24 {
        match n % 3 {
            0 => source.push_str(&format!("  @Unimplemented var e{n}: (Int) -> Void\n")),
            1 => source.push_str(&format!("  @DependencyEndpoint var e{n}: () -> Bool\n")),
            _ => source.push_str(&format!("  @Unimplemented var e{n}: () throws -> [Int]\n")),
        }
    }
    source.push_str("}\n");

    let sequential = Expander::default().expand(&source).unwrap();
    let parallel = Expander::new(Config {
        parallel: true,
        ..Config::default()
    })
    .expand(&source)
    .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(sequential.artifacts.len(), 16);
    assert_eq!(sequential.diagnostics.len(), 8);
}

#[test]
fn runtime_names_come_from_configuration() {
    let config = Config::from_toml_str(
        r#"
        [runtime]
        report_failure = "reportIssue"
        tracking_handle = "Tracker"

        [render]
        indent = 4
        "#,
    )
    .unwrap();
    let expansion = Expander::new(config)
        .expand("@Unimplemented var f: () -> Void")
        .unwrap();
    assert!(expansion.source.contains("\n    get {\n        _f\n    }"));
    assert!(expansion.source.contains("let implemented = Tracker(\"f\")"));
    assert!(expansion.source.contains("    reportIssue(\"Unimplemented: 'f'\")"));
}
