//! Identifier helpers shared by the classifier and the renderers.

/* Convert `CamelCase` (including acronyms like `HTTPServer`) to `snake_case` */
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Alignas", "_Alignof", "_Atomic",
    "_Bool", "_Complex", "_Generic", "_Imaginary", "_Noreturn", "_Static_assert",
    "_Thread_local", "bool", "size_t", "ssize_t", "ptrdiff_t", "wchar_t", "NULL",
];

/// Shim helpers that a parameter of the same name would shadow.
const SHIM_RESERVED: &[&str] = &[
    "_handle",
    "self",
    "bool_to_c",
    "c_to_bool",
    "string_to_c",
    "c_to_string",
    "error_message",
    "handles",
    "convert",
];

pub fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

pub fn is_c_keyword(name: &str) -> bool {
    C_KEYWORDS.contains(&name)
}

pub fn is_rust_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name)
}

/* Escape Python keywords for host-visible names */
pub fn escape_python_keyword(name: &str) -> String {
    if is_python_keyword(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Name of a free-function export. The same text is a Rust item, a C
/// symbol and a Python attribute of the extension, so it must survive all
/// three keyword sets and stay clear of the shim's own helpers.
pub fn export_name(name: &str) -> String {
    let reserved = is_python_keyword(name)
        || is_c_keyword(name)
        || is_rust_keyword(name)
        || SHIM_RESERVED.contains(&name)
        || name.starts_with("hb_")
        || name.ends_with("_to_handle")
        || name.ends_with("_from_handle");
    if reserved {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/* Native member or item name as written in shim code; Rust keywords become raw identifiers */
pub fn rust_ident(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" | "_" => name.to_string(),
        _ if is_rust_keyword(name) => format!("r#{}", name),
        _ => name.to_string(),
    }
}

/// Name of a parameter as it appears in all three fragments of a call.
///
/// A single trailing `_` is added when the name is a keyword in any of the
/// three target languages, shadows a shim helper, uses the `hb_` prefix
/// reserved for shim locals, or equals the extension module name.
pub fn binding_param_name(name: &str, extension_module: &str) -> String {
    let reserved = is_python_keyword(name)
        || is_c_keyword(name)
        || is_rust_keyword(name)
        || SHIM_RESERVED.contains(&name)
        || name.starts_with("hb_")
        || name.ends_with("_to_handle")
        || name.ends_with("_from_handle")
        || name == extension_module;
    if reserved {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("Foo"), "foo");
        assert_eq!(snake_case("FooBar"), "foo_bar");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("Vec3d"), "vec3d");
        assert_eq!(snake_case("Rgb2Hsv"), "rgb2_hsv");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_param_names_are_escaped_consistently() {
        assert_eq!(binding_param_name("lambda", "_m"), "lambda_");
        assert_eq!(binding_param_name("int", "_m"), "int_");
        assert_eq!(binding_param_name("type", "_m"), "type_");
        assert_eq!(binding_param_name("_handle", "_m"), "_handle_");
        assert_eq!(binding_param_name("hb_ret", "_m"), "hb_ret_");
        assert_eq!(binding_param_name("_m", "_m"), "_m_");
        assert_eq!(binding_param_name("width", "_m"), "width");
    }

    #[test]
    fn test_export_names_survive_every_language() {
        assert_eq!(export_name("match"), "match_");
        assert_eq!(export_name("pass"), "pass_");
        assert_eq!(export_name("double"), "double_");
        assert_eq!(export_name("bool_to_c"), "bool_to_c_");
        assert_eq!(export_name("hb_registry"), "hb_registry_");
        assert_eq!(export_name("foo_to_handle"), "foo_to_handle_");
        assert_eq!(export_name("Divide"), "Divide");
    }

    #[test]
    fn test_rust_ident_uses_raw_identifiers() {
        assert_eq!(rust_ident("loop"), "r#loop");
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("area"), "area");
        assert_eq!(rust_ident("self"), "self");
    }

    #[test]
    fn test_keyword_escapes() {
        assert_eq!(escape_python_keyword("None"), "None_");
        assert_eq!(escape_python_keyword("Area"), "Area");
        assert!(is_identifier("Foo_Get"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
