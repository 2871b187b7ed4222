//! Per-language grammar tables and extension dispatch.
//!
//! Each supported language is one row in a data-driven [`LanguageProfile`]
//! table consulted by [`crate::extract`], rather than a bespoke trait impl
//! per language: a const array of profiles plus a path-extension lookup
//! (`language_key_for_path`) dispatches to the right grammar and behavior.

use tree_sitter::Language;

/// How a language marks doc comments for declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocstringStyle {
    /// The first statement in a body is a string literal (Python, Ruby
    /// `=begin`-less convention approximated as first string stmt).
    FirstStatementString,
    /// A block comment immediately preceding the declaration, within two
    /// blank lines (JSDoc `/** ... */`, Rust/Java/C# `///`/`/// `, PHPDoc).
    PrecedingBlockComment,
}

/// A per-language grammar table: which node kinds mean what.
pub struct LanguageProfile {
    /// Canonical language key, e.g. `"python"`.
    pub key: &'static str,
    /// File extensions mapped to this language (without the leading dot).
    pub extensions: &'static [&'static str],
    /// Lazily construct the tree-sitter `Language`.
    pub language: fn() -> Language,
    /// Node kinds that represent a standalone function declaration.
    pub function_kinds: &'static [&'static str],
    /// Node kinds that represent a method inside a class body (often the
    /// same as `function_kinds`).
    pub method_kinds: &'static [&'static str],
    /// Node kinds that represent a class/struct/interface declaration.
    pub class_kinds: &'static [&'static str],
    /// Node kinds that represent an import/use/require statement.
    pub import_kinds: &'static [&'static str],
    /// Node kinds that represent a decorator/annotation attached to a
    /// function or class.
    pub decorator_kinds: &'static [&'static str],
    /// Node kind for an async-modifier keyword token, if the grammar
    /// surfaces it as a distinct child (else detected by source text scan).
    pub async_keyword: Option<&'static str>,
    /// Docstring convention.
    pub docstring_style: DocstringStyle,
    /// Line-comment prefix, for the inline-comment bonus.
    pub line_comment_prefix: &'static str,
}

fn py_lang() -> Language {
    tree_sitter_python::LANGUAGE.into()
}
fn js_lang() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}
fn ts_lang() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}
fn tsx_lang() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}
fn rust_lang_fn() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}
fn go_lang() -> Language {
    tree_sitter_go::LANGUAGE.into()
}
fn cpp_lang() -> Language {
    tree_sitter_cpp::LANGUAGE.into()
}
fn java_lang() -> Language {
    tree_sitter_java::LANGUAGE.into()
}
fn csharp_lang() -> Language {
    tree_sitter_c_sharp::LANGUAGE.into()
}
fn ruby_lang() -> Language {
    tree_sitter_ruby::LANGUAGE.into()
}
fn php_lang() -> Language {
    tree_sitter_php::LANGUAGE_PHP.into()
}

/// The ten supported languages' grammar tables, plus a TSX variant of
/// TypeScript selected by extension (kept under the `"typescript"` key).
pub static PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        key: "python",
        extensions: &["py", "pyi"],
        language: py_lang,
        function_kinds: &["function_definition"],
        method_kinds: &["function_definition"],
        class_kinds: &["class_definition"],
        import_kinds: &["import_statement", "import_from_statement"],
        decorator_kinds: &["decorator"],
        async_keyword: None,
        docstring_style: DocstringStyle::FirstStatementString,
        line_comment_prefix: "#",
    },
    LanguageProfile {
        key: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        language: js_lang,
        function_kinds: &[
            "function_declaration",
            "function",
            "generator_function_declaration",
            "arrow_function",
        ],
        method_kinds: &["method_definition"],
        class_kinds: &["class_declaration", "class"],
        import_kinds: &["import_statement", "lexical_declaration"],
        decorator_kinds: &["decorator"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "typescript",
        extensions: &["ts"],
        language: ts_lang,
        function_kinds: &[
            "function_declaration",
            "function_signature",
            "arrow_function",
        ],
        method_kinds: &["method_definition", "method_signature"],
        class_kinds: &["class_declaration", "interface_declaration"],
        import_kinds: &["import_statement", "lexical_declaration"],
        decorator_kinds: &["decorator"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "tsx",
        extensions: &["tsx"],
        language: tsx_lang,
        function_kinds: &["function_declaration", "arrow_function"],
        method_kinds: &["method_definition"],
        class_kinds: &["class_declaration", "interface_declaration"],
        import_kinds: &["import_statement", "lexical_declaration"],
        decorator_kinds: &["decorator"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "java",
        extensions: &["java"],
        language: java_lang,
        function_kinds: &["method_declaration"],
        method_kinds: &["method_declaration"],
        class_kinds: &["class_declaration", "interface_declaration", "enum_declaration"],
        import_kinds: &["import_declaration"],
        decorator_kinds: &["annotation", "marker_annotation"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "go",
        extensions: &["go"],
        language: go_lang,
        function_kinds: &["function_declaration"],
        method_kinds: &["method_declaration"],
        class_kinds: &["type_declaration"],
        import_kinds: &["import_declaration"],
        decorator_kinds: &[],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "rust",
        extensions: &["rs"],
        language: rust_lang_fn,
        function_kinds: &["function_item"],
        method_kinds: &["function_item"],
        class_kinds: &["struct_item", "enum_item", "trait_item"],
        import_kinds: &["use_declaration"],
        decorator_kinds: &["attribute_item"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "cpp",
        extensions: &["cpp", "cc", "cxx", "c", "hpp", "h"],
        language: cpp_lang,
        function_kinds: &["function_definition"],
        method_kinds: &["function_definition"],
        class_kinds: &["class_specifier", "struct_specifier"],
        import_kinds: &["preproc_include"],
        decorator_kinds: &["attribute_declaration"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "csharp",
        extensions: &["cs"],
        language: csharp_lang,
        function_kinds: &["method_declaration", "local_function_statement"],
        method_kinds: &["method_declaration"],
        class_kinds: &["class_declaration", "interface_declaration", "struct_declaration"],
        import_kinds: &["using_directive"],
        decorator_kinds: &["attribute_list"],
        async_keyword: Some("async"),
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
    LanguageProfile {
        key: "ruby",
        extensions: &["rb"],
        language: ruby_lang,
        function_kinds: &["method"],
        method_kinds: &["method"],
        class_kinds: &["class", "module"],
        import_kinds: &["call"],
        decorator_kinds: &[],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "#",
    },
    LanguageProfile {
        key: "php",
        extensions: &["php"],
        language: php_lang,
        function_kinds: &["function_definition"],
        method_kinds: &["method_declaration"],
        class_kinds: &["class_declaration", "interface_declaration"],
        import_kinds: &["namespace_use_declaration"],
        decorator_kinds: &["attribute_list"],
        async_keyword: None,
        docstring_style: DocstringStyle::PrecedingBlockComment,
        line_comment_prefix: "//",
    },
];

/// Look up a profile by its canonical key (`"python"`, `"rust"`, ...).
pub fn profile_for_key(key: &str) -> Option<&'static LanguageProfile> {
    let normalized = normalize_language_key(key);
    PROFILES.iter().find(|p| p.key == normalized.as_str())
}

/// Convert an `&str` alias or canonical key into the canonical key, as an
/// owned `String` so no lifetime tricks are needed for unknown inputs.
fn normalize_language_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "py" | "python3" => "python".to_string(),
        "js" | "node" => "javascript".to_string(),
        "ts" => "typescript".to_string(),
        "rb" => "ruby".to_string(),
        "rs" => "rust".to_string(),
        "cs" => "csharp".to_string(),
        "c++" | "cxx" => "cpp".to_string(),
        other => other.to_string(),
    }
}

/// Determine the language key for a file path purely from its extension.
/// Returns `None` for unmapped extensions (caller raises
/// `UnsupportedLanguage`). `.ipynb` is intentionally excluded — routing a
/// notebook to its kernel language happens in [`crate::notebook`].
pub fn language_key_for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    PROFILES
        .iter()
        .find(|p| p.extensions.contains(&ext.as_str()))
        .map(|p| p.key)
}

/// Look up a profile directly from a file path's extension.
pub fn profile_for_path(path: &str) -> Option<&'static LanguageProfile> {
    language_key_for_path(path).and_then(profile_for_key)
}

/// True if `path`'s extension has a registered language.
pub fn extension_is_supported(path: &str) -> bool {
    language_key_for_path(path).is_some() || path.to_ascii_lowercase().ends_with(".ipynb")
}
