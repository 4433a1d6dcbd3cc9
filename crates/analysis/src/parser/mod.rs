//! Structural parsing of source files via tree-sitter.
//!
//! One grammar per supported language, cursor-driven extraction of the
//! declaration outline (functions, classes, imports) plus a branch count per
//! function for complexity scoring. Parsing never fails the batch: syntax
//! errors and unregistered grammars both degrade to a lexical fallback unit
//! that text rules can still inspect.

pub mod language;

pub use language::Language;

use crate::core::LineRange;
use crate::selector::SourceFile;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Function,
    Class,
    Import,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    pub range: LineRange,
    /// Count of branching constructs in the subtree; meaningful for functions.
    pub branch_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NoGrammar,
    SyntaxError,
}

#[derive(Debug, Clone)]
pub enum Outline {
    Parsed { declarations: Vec<Declaration> },
    Fallback { reason: FallbackReason },
}

/// Parsed representation of one source file. Produced once per file and
/// consumed read-only by the rule engine.
#[derive(Debug, Clone)]
pub struct StructuralUnit {
    file: Arc<SourceFile>,
    outline: Outline,
}

impl StructuralUnit {
    pub fn path(&self) -> &str {
        &self.file.path
    }

    pub fn language(&self) -> Language {
        self.file.language
    }

    pub fn content(&self) -> &str {
        &self.file.content
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.file.content.lines()
    }

    pub fn line_count(&self) -> usize {
        self.file.content.lines().count()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outline, Outline::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.outline {
            Outline::Fallback { reason } => Some(reason),
            Outline::Parsed { .. } => None,
        }
    }

    pub fn declarations(&self) -> &[Declaration] {
        match &self.outline {
            Outline::Parsed { declarations } => declarations,
            Outline::Fallback { .. } => &[],
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations()
            .iter()
            .filter(|d| d.kind == DeclKind::Function)
    }
}

/// Node-kind tables driving extraction for one grammar.
struct KindTable {
    functions: &'static [&'static str],
    classes: &'static [&'static str],
    imports: &'static [&'static str],
    branches: &'static [&'static str],
}

const PYTHON_KINDS: KindTable = KindTable {
    functions: &["function_definition"],
    classes: &["class_definition"],
    imports: &["import_statement", "import_from_statement"],
    branches: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "except_clause",
        "case_clause",
        "conditional_expression",
        "boolean_operator",
    ],
};

const ECMASCRIPT_KINDS: KindTable = KindTable {
    functions: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    classes: &["class_declaration"],
    imports: &["import_statement"],
    branches: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "switch_case",
        "catch_clause",
        "ternary_expression",
    ],
};

const JAVA_KINDS: KindTable = KindTable {
    functions: &["method_declaration", "constructor_declaration"],
    classes: &["class_declaration", "interface_declaration"],
    imports: &["import_declaration"],
    branches: &[
        "if_statement",
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "do_statement",
        "switch_label",
        "catch_clause",
        "ternary_expression",
    ],
};

const GO_KINDS: KindTable = KindTable {
    functions: &["function_declaration", "method_declaration"],
    classes: &["type_declaration"],
    imports: &["import_declaration"],
    branches: &[
        "if_statement",
        "for_statement",
        "expression_case",
        "type_case",
        "communication_case",
    ],
};

const C_FAMILY_KINDS: KindTable = KindTable {
    functions: &["function_definition"],
    classes: &["struct_specifier", "class_specifier"],
    imports: &["preproc_include"],
    branches: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "do_statement",
        "case_statement",
        "conditional_expression",
    ],
};

// Lexical-only languages never reach extraction.
const EMPTY_KINDS: KindTable = KindTable {
    functions: &[],
    classes: &[],
    imports: &[],
    branches: &[],
};

fn kind_table(language: Language) -> &'static KindTable {
    match language {
        Language::Python => &PYTHON_KINDS,
        Language::JavaScript | Language::TypeScript => &ECMASCRIPT_KINDS,
        Language::Java => &JAVA_KINDS,
        Language::Go => &GO_KINDS,
        Language::C | Language::Cpp => &C_FAMILY_KINDS,
        Language::CSharp | Language::Ruby | Language::Php => &EMPTY_KINDS,
    }
}

/// Grammar registry plus the parse entry point. Grammars are loaded once at
/// startup; `Parser` instances are created per call since they are cheap and
/// not `Sync`.
pub struct ParserManager {
    grammars: HashMap<Language, tree_sitter::Language>,
}

impl ParserManager {
    pub fn new() -> Self {
        let mut grammars = HashMap::new();
        grammars.insert(Language::Python, tree_sitter_python::LANGUAGE.into());
        grammars.insert(
            Language::JavaScript,
            tree_sitter_javascript::LANGUAGE.into(),
        );
        grammars.insert(
            Language::TypeScript,
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        );
        grammars.insert(Language::Java, tree_sitter_java::LANGUAGE.into());
        grammars.insert(Language::Go, tree_sitter_go::LANGUAGE.into());
        grammars.insert(Language::C, tree_sitter_c::LANGUAGE.into());
        grammars.insert(Language::Cpp, tree_sitter_cpp::LANGUAGE.into());
        Self { grammars }
    }

    pub fn supports(&self, language: Language) -> bool {
        self.grammars.contains_key(&language)
    }

    /// Parse one file into its structural unit. Never errors: a missing
    /// grammar or a syntax error yields the fallback variant so one file's
    /// parse failure cannot fail the batch.
    pub fn parse(&self, file: Arc<SourceFile>) -> StructuralUnit {
        let grammar = match self.grammars.get(&file.language) {
            Some(g) => g.clone(),
            None => {
                debug!(path = %file.path, language = %file.language, "no grammar registered, lexical fallback");
                return StructuralUnit {
                    file,
                    outline: Outline::Fallback {
                        reason: FallbackReason::NoGrammar,
                    },
                };
            }
        };

        let mut parser = tree_sitter::Parser::new();
        if parser.set_language(&grammar).is_err() {
            return StructuralUnit {
                file,
                outline: Outline::Fallback {
                    reason: FallbackReason::NoGrammar,
                },
            };
        }

        let tree = match parser.parse(file.content.as_bytes(), None) {
            Some(tree) => tree,
            None => {
                return StructuralUnit {
                    file,
                    outline: Outline::Fallback {
                        reason: FallbackReason::SyntaxError,
                    },
                };
            }
        };

        if tree.root_node().has_error() {
            debug!(path = %file.path, "syntax errors in tree, lexical fallback");
            return StructuralUnit {
                file,
                outline: Outline::Fallback {
                    reason: FallbackReason::SyntaxError,
                },
            };
        }

        let table = kind_table(file.language);
        let mut declarations = Vec::new();
        collect_declarations(tree.root_node(), &file.content, table, &mut declarations);

        StructuralUnit {
            file,
            outline: Outline::Parsed { declarations },
        }
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_declarations(
    node: Node<'_>,
    source: &str,
    table: &KindTable,
    out: &mut Vec<Declaration>,
) {
    let kind = node.kind();

    let decl_kind = if table.functions.contains(&kind) {
        Some(DeclKind::Function)
    } else if table.classes.contains(&kind) {
        Some(DeclKind::Class)
    } else if table.imports.contains(&kind) {
        Some(DeclKind::Import)
    } else {
        None
    };

    if let Some(decl_kind) = decl_kind {
        let range = LineRange::new(
            node.start_position().row + 1,
            node.end_position().row + 1,
        );
        let name = match decl_kind {
            DeclKind::Import => node_first_line(node, source),
            _ => declaration_name(node, source),
        };
        let branch_count = if decl_kind == DeclKind::Function {
            count_branches(node, table)
        } else {
            0
        };
        out.push(Declaration {
            kind: decl_kind,
            name,
            range,
            branch_count,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_declarations(child, source, table, out);
    }
}

fn declaration_name(node: Node<'_>, source: &str) -> String {
    if let Some(name_node) = node.child_by_field_name("name") {
        return name_node
            .utf8_text(source.as_bytes())
            .unwrap_or("unknown")
            .to_string();
    }

    // C/C++ function definitions bury the name inside the declarator.
    if let Some(declarator) = node.child_by_field_name("declarator") {
        if let Some(name) = find_identifier(declarator, source) {
            return name;
        }
    }

    "unknown".to_string()
}

fn find_identifier(node: Node<'_>, source: &str) -> Option<String> {
    if matches!(
        node.kind(),
        "identifier" | "field_identifier" | "qualified_identifier"
    ) {
        return node
            .utf8_text(source.as_bytes())
            .ok()
            .map(|s| s.to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_identifier(child, source) {
            return Some(found);
        }
    }
    None
}

fn node_first_line(node: Node<'_>, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

fn count_branches(node: Node<'_>, table: &KindTable) -> u32 {
    let mut count = 0;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if table.branches.contains(&child.kind()) {
            count += 1;
        }
        count += count_branches(child, table);
    }
    count
}
