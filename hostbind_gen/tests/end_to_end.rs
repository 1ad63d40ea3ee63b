use hostbind_gen::codegen::{self, GeneratedBindings};
use hostbind_gen::config::GenConfig;
use hostbind_gen::errors::SkipReason;
use hostbind_gen::model::Package;
use hostbind_gen::types::PackageFile;

/* Helper to analyze and generate from inline YAML */
fn generate(yaml: &str) -> GeneratedBindings {
    let file: PackageFile = serde_yml::from_str(yaml).expect("description should parse");
    let config = GenConfig::default();
    let package = Package::analyze(&file, &config);
    codegen::generate(&package, &config, "shapes.yaml").expect("generation should succeed")
}

/* Extract one `extern "C"` entry point (from its attribute to its closing brace) */
fn shim_fn<'a>(shim: &'a str, export: &str) -> &'a str {
    let signature = format!("pub extern \"C\" fn {}(", export);
    let start = shim
        .find(&signature)
        .unwrap_or_else(|| panic!("missing shim entry point {}", export));
    let start = shim[..start].rfind("#[no_mangle]").unwrap();
    let end = start + shim[start..].find("\n}\n").unwrap() + 3;
    &shim[start..end]
}

fn all_streams(bindings: &GeneratedBindings) -> String {
    format!("{}{}{}", bindings.shim, bindings.build_script, bindings.wrapper)
}

#[test]
fn test_method_without_failure_returns_plain_value() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind:
      struct:
        fields:
          - { name: value, type: i64 }
        methods:
          - { name: Get, native-name: get, results: [i64] }
"#,
    );

    let shim = shim_fn(&bindings.shim, "Foo_Get");
    assert_eq!(
        shim,
        "#[no_mangle]
pub extern \"C\" fn Foo_Get(_handle: CHandle) -> i64 {
    let hb_reg = hb_registry();
    let hb_recv = match foo_from_handle(hb_reg, _handle) {
        Ok(value) => value,
        Err(_) => return 0,
    };
    hb_recv.get()
}
"
    );
    assert!(!shim.contains("hb_raise"));

    assert!(bindings.build_script.contains(
        "add_function('Foo_Get', 'int64_t', [('int64_t', '_handle')])\n"
    ));
    assert!(bindings.wrapper.contains(
        "class Foo(NativeObject):\n"
    ));
    assert!(bindings.wrapper.contains(
        "    def Get(self):\n        return _shapes.Foo_Get(self.handle)\n"
    ));
    assert!(bindings.wrapper.contains(
        "    @property\n    def value(self):\n        return _shapes.Foo_value_Get(self.handle)\n"
    ));
}

#[test]
fn test_failing_function_raises_with_error_text() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
functions:
  - name: Divide
    native-name: divide
    params: [{ name: a, type: i64 }, { name: b, type: i64 }]
    results: [i64, error]
"#,
    );

    assert_eq!(
        shim_fn(&bindings.shim, "Divide"),
        "#[no_mangle]
pub extern \"C\" fn Divide(a: i64, b: i64) -> i64 {
    match shapes::divide(a, b) {
        Ok(hb_ret) => hb_ret,
        Err(hb_err) => {
            hb_raise(&hb_err.to_string());
            0
        }
    }
}
"
    );
    assert!(bindings.build_script.contains(
        "add_function('Divide', 'int64_t', [('int64_t', 'a'), ('int64_t', 'b')], checked=True)\n"
    ));
    assert!(bindings
        .wrapper
        .contains("def Divide(a, b):\n    return _shapes.Divide(a, b)\n"));
}

#[test]
fn test_constructor_allocates_pointee_and_wraps_instance() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind: { struct: {} }
functions:
  - name: NewFoo
    native-name: new_foo
    params: [{ name: value, type: i64 }]
    results: ["Box<Foo>", error]
"#,
    );

    assert!(bindings.shim.contains(
        "fn foo_ptr_to_handle(registry: &HandleRegistry, value: Box<shapes::Foo>) -> CHandle {
    registry.allocate(*value) as CHandle
}
"
    ));
    let ctor = shim_fn(&bindings.shim, "NewFoo");
    assert!(ctor.contains("let hb_reg = hb_registry();"));
    assert!(ctor.contains("Ok(hb_ret) => foo_ptr_to_handle(hb_reg, hb_ret),"));

    assert!(bindings
        .wrapper
        .contains("def NewFoo(value):\n    return Foo(handle=_shapes.NewFoo(value))\n"));

    let constructors = bindings.wrapper.find("# ---- Constructors ---").unwrap();
    let class = bindings.wrapper.find("class Foo(NativeObject):").unwrap();
    let ctor = bindings.wrapper.find("def NewFoo(").unwrap();
    assert!(class < constructors && constructors < ctor);
}

#[test]
fn test_skipped_signatures_appear_in_no_stream() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
functions:
  - { name: Triple, results: [i64, i64, error] }
  - { name: Pair, results: [i64, i64] }
  - { name: Apply, params: [{ name: f, type: "fn(i64) -> i64" }], results: [i64] }
  - { name: Values, results: ["Vec<i64>"] }
  - { name: Keep, results: [i64] }
"#,
    );

    let text = all_streams(&bindings);
    for name in ["Triple", "Pair", "Apply", "Values"] {
        assert!(!text.contains(name), "{} leaked into the output", name);
    }
    assert!(text.contains("Keep"));

    let reasons: Vec<(&str, &SkipReason)> = bindings
        .diagnostics()
        .iter()
        .map(|d| (d.symbol.as_str(), &d.reason))
        .collect();
    assert!(matches!(reasons[0], ("Triple", SkipReason::TooManyResults { count: 3 })));
    assert!(matches!(reasons[1], ("Pair", SkipReason::SecondResultNotError { .. })));
    assert!(matches!(reasons[2], ("Apply", SkipReason::FunctionParameter { .. })));
    assert!(matches!(reasons[3], ("Values", SkipReason::Unsupported { .. })));
}

#[test]
fn test_method_export_name_is_unique() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind:
      struct:
        methods:
          - { name: Bar, results: [i64] }
functions:
  - { name: Foo_Bar, results: [i64] }
"#,
    );

    assert_eq!(bindings.shim.matches("fn Foo_Bar(").count(), 1);
    assert_eq!(bindings.build_script.matches("add_function('Foo_Bar'").count(), 1);
    /* the method claimed the export first; the free function is skipped */
    assert!(bindings.shim.contains("pub extern \"C\" fn Foo_Bar(_handle: CHandle)"));
    assert_eq!(bindings.diagnostics()[0].symbol, "Foo_Bar");
}

#[test]
fn test_sections_follow_fixed_order_in_every_stream() {
    let bindings = generate(include_str!("../../demos/shapes.bind.yaml"));
    let titles = [
        "Types",
        "Constants",
        "Global Variables: can only use functions to access",
        "Interfaces",
        "Structs",
        "Constructors",
        "Functions",
    ];
    for (stream, marker) in [
        (&bindings.shim, "//"),
        (&bindings.build_script, "#"),
        (&bindings.wrapper, "#"),
    ] {
        let mut last = 0;
        for title in titles {
            let header = format!("{} ---- {} ---", marker, title);
            let at = stream
                .find(&header)
                .unwrap_or_else(|| panic!("missing section header {:?}", header));
            assert!(at >= last, "section {:?} out of order", title);
            last = at;
        }
    }
}

#[test]
fn test_demo_package_nesting_is_balanced() {
    let bindings = generate(include_str!("../../demos/shapes.bind.yaml"));

    /* every shim entry point is closed at column zero */
    let opens = bindings.shim.matches("\npub extern \"C\" fn ").count();
    assert!(opens > 0);
    let braces: i64 = bindings
        .shim
        .chars()
        .map(|c| match c {
            '{' => 1,
            '}' => -1,
            _ => 0,
        })
        .sum();
    assert_eq!(braces, 0);

    /* module-level wrapper functions start at column zero after the classes */
    let functions = bindings.wrapper.find("# ---- Functions ---").unwrap();
    for line in bindings.wrapper[functions..].lines() {
        if line.trim_start().starts_with("def ") {
            assert!(line.starts_with("def "), "nested def leaked: {:?}", line);
        }
    }

    assert!(bindings.wrapper.contains("Pi = 3.14159\n"));
    assert!(bindings.wrapper.contains("Debug = False\n"));
    assert!(bindings.wrapper.contains("def Counter_Set(value):\n"));
    assert!(bindings.wrapper.contains("def Default_Get():\n    return Foo(handle=_shapes.Default_Get())\n"));
    assert!(!bindings.wrapper.contains("Default_Set"));
    assert!(bindings.shim.contains("shapes::Shape::area(&**hb_recv)"));
    assert!(bindings.makefile.contains("--extern shapes=$(NATIVE_RLIB)"));
}

#[test]
fn test_regenerate_command_recorded_in_every_stream() {
    let bindings = generate("package: { path: shapes, name: shapes }\n");
    for (_, contents) in bindings.files() {
        assert!(contents.contains("hostbind gen --vm=python3 -f shapes.yaml"));
    }
}

#[test]
fn test_translate_fragments_match_full_streams() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
functions:
  - { name: Ready, native-name: ready, results: [bool] }
"#,
    );
    let call = bindings.ir.calls()[0];
    let fragments = hostbind_gen::codegen::shared::translator::translate_fragments(call, "_shapes");
    assert!(bindings.shim.contains(&fragments.shim));
    assert!(bindings.build_script.contains(fragments.declaration.trim_end()));
    assert!(bindings.wrapper.contains(&fragments.wrapper));
    assert!(fragments.shim.contains("bool_to_c(shapes::ready())"));
}

#[test]
fn test_keyword_names_stay_valid_in_every_stream() {
    let bindings = generate(
        r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind:
      struct:
        fields:
          - { name: type, type: i64 }
        methods:
          - { name: Loop, native-name: loop, results: [i64] }
functions:
  - { name: match, results: [i64] }
  - { name: pass, results: [i64] }
  - { name: bool_to_c, results: [bool] }
"#,
    );

    /* exports escape keywords of all three languages and preamble helpers */
    assert!(bindings.shim.contains("pub extern \"C\" fn match_() -> i64 {\n    shapes::r#match()\n}\n"));
    assert!(bindings.shim.contains("pub extern \"C\" fn pass_() -> i64 {"));
    assert!(bindings.shim.contains("pub extern \"C\" fn bool_to_c_() -> c_char {"));
    assert!(!bindings.shim.contains("fn match("));
    assert_eq!(bindings.shim.matches("fn bool_to_c(").count(), 1);

    /* native members named like Rust keywords are written as raw identifiers */
    assert!(bindings.shim.contains("hb_recv.r#loop()"));
    assert!(bindings.shim.contains("hb_recv.r#type.clone()"));

    assert!(bindings.wrapper.contains("def pass_():\n    return _shapes.pass_()\n"));
    assert!(bindings.wrapper.contains("def match():\n    return _shapes.match_()\n"));
    assert!(!bindings.wrapper.contains("_shapes.pass()"));
    assert!(bindings.build_script.contains("add_function('match_', 'int64_t', [])\n"));
    assert!(bindings.diagnostics().is_empty());
}
