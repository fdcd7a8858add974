//! Wings — the module resolver and import preprocessor.
//!
//! Given a main file path, walks its `import` directives, recursively
//! loading and lexing any wing (sibling source file) it names, resolving
//! built-in library imports by name, and rewriting tokens so the parser
//! never has to think about `import` at all.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use spin_base::{ErrorCode, Interner, Result, Span, SpannedError, Symbol};

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// One of the three libraries `import` can name instead of a file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryId {
    Console,
    Kronos,
    Maths,
}

impl LibraryId {
    fn from_name(name: &str) -> Option<LibraryId> {
        match name {
            "Console" => Some(LibraryId::Console),
            "Kronos" => Some(LibraryId::Kronos),
            "Maths" => Some(LibraryId::Maths),
            _ => None,
        }
    }
}

/// One source file's lexed contents (spec's `CodeUnit`).
pub struct CodeUnit {
    pub name: String,
    pub contents: String,
    pub tokens: Vec<Token>,
}

/// The fully resolved program: the main unit, its wings in dependency
/// order (deepest first), and the set of libraries it pulled in.
pub struct Program {
    pub main: CodeUnit,
    pub wings: Vec<CodeUnit>,
    pub libraries: Vec<LibraryId>,
}

/// Resolves `main_path` and every file it transitively imports.
pub fn resolve(main_path: &Path, interner: &mut Interner) -> Result<Program> {
    let mut resolver = Resolver {
        interner,
        visited: HashSet::new(),
        libraries: Vec::new(),
        wings: Vec::new(),
    };
    let main_name = main_path.to_string_lossy().into_owned();
    resolver.visited.insert(canonicalize(main_path));
    log::debug!("resolving wings from '{}'", main_name);
    let mut main = resolver.load_and_lex(main_path, &main_name)?;
    resolver.process_unit(main_path, &mut main)?;
    log::debug!(
        "resolved {} wing(s), {} librar(ies)",
        resolver.wings.len(),
        resolver.libraries.len()
    );
    Ok(Program {
        main,
        wings: resolver.wings,
        libraries: resolver.libraries,
    })
}

fn canonicalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

struct Resolver<'i> {
    interner: &'i mut Interner,
    visited: HashSet<PathBuf>,
    libraries: Vec<LibraryId>,
    wings: Vec<CodeUnit>,
}

impl<'i> Resolver<'i> {
    fn load_and_lex(&mut self, path: &Path, name: &str) -> Result<CodeUnit> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SpannedError::new(
                ErrorCode::FileManagement,
                format!("could not read '{}': {}", path.display(), e),
                Span::at(0),
            )
        })?;
        let tokens = Lexer::new(&contents, self.interner).tokenize();
        Ok(CodeUnit {
            name: name.to_string(),
            contents,
            tokens,
        })
    }

    /// Scans `unit`'s tokens for `import` directives, resolving each one
    /// in place (blanking its tokens to `Empty`), then runs the
    /// type-classification pass and compacts empties out.
    fn process_unit(&mut self, unit_path: &Path, unit: &mut CodeUnit) -> Result<()> {
        let mut reclassify: Vec<Symbol> = Vec::new();
        let mut i = 0;
        while i < unit.tokens.len() {
            if unit.tokens[i].kind == TokenKind::ImportKeyword {
                let end = self.resolve_import(unit_path, unit, i, &mut reclassify)?;
                for t in &mut unit.tokens[i..end] {
                    t.kind = TokenKind::Empty;
                }
                i = end;
            } else {
                i += 1;
            }
        }
        for name in reclassify {
            for t in unit.tokens.iter_mut() {
                if t.kind == TokenKind::Identifier && t.lexeme == name {
                    t.kind = TokenKind::CustomType;
                }
            }
        }
        classify_types_following_type_names(&mut unit.tokens);
        unit.tokens.retain(|t| t.kind != TokenKind::Empty);
        Ok(())
    }

    /// Resolves one `import A::B::C;` directive starting at `start` (the
    /// `import` keyword). Returns the index one past the terminating `;`.
    fn resolve_import(
        &mut self,
        unit_path: &Path,
        unit: &CodeUnit,
        start: usize,
        reclassify: &mut Vec<Symbol>,
    ) -> Result<usize> {
        let mut i = start + 1;
        let mut segments: Vec<Symbol> = Vec::new();
        loop {
            match unit.tokens.get(i) {
                Some(t) if t.kind == TokenKind::BeginFile || t.kind == TokenKind::EndFile => {
                    return Err(SpannedError::new(
                        ErrorCode::Preprocessor,
                        "unexpected end of file inside import directive",
                        Span::at(t.position as usize),
                    ));
                }
                Some(t) if t.kind == TokenKind::Identifier || t.kind == TokenKind::CustomType => {
                    segments.push(t.lexeme);
                    i += 1;
                }
                _ => break,
            }
            match unit.tokens.get(i) {
                Some(t) if t.kind == TokenKind::ColonColon => {
                    i += 1;
                }
                _ => break,
            }
        }
        match unit.tokens.get(i) {
            Some(t) if t.kind == TokenKind::Semicolon => {}
            Some(t) => {
                return Err(SpannedError::new(
                    ErrorCode::Preprocessor,
                    "expected ';' at the end of an import directive",
                    Span::at(t.position as usize),
                ));
            }
            None => {
                return Err(SpannedError::new(
                    ErrorCode::Preprocessor,
                    "unexpected end of file inside import directive",
                    Span::at(unit.tokens.last().map(|t| t.position as usize).unwrap_or(0)),
                ));
            }
        }
        let end = i + 1;

        if segments.is_empty() {
            return Err(SpannedError::new(
                ErrorCode::Preprocessor,
                "malformed import: expected a dotted name after 'import'",
                Span::at(unit.tokens[start].position as usize),
            ));
        }

        let trailing = *segments.last().unwrap();
        let trailing_name = self.interner.resolve(trailing).to_string();

        if segments.len() == 1 {
            if let Some(lib) = LibraryId::from_name(&trailing_name) {
                if !self.libraries.contains(&lib) {
                    self.libraries.push(lib);
                }
                reclassify.push(trailing);
                return Ok(end);
            }
        }

        let mut rel = PathBuf::new();
        for seg in &segments {
            rel.push(self.interner.resolve(*seg));
        }
        rel.set_extension("spin");
        let base_dir = unit_path.parent().unwrap_or_else(|| Path::new("."));
        let wing_path = base_dir.join(&rel);
        let canonical = canonicalize(&wing_path);

        reclassify.push(trailing);

        if self.visited.contains(&canonical) {
            return Ok(end);
        }
        self.visited.insert(canonical);

        let wing_name = wing_path.to_string_lossy().into_owned();
        log::trace!("loading wing '{}'", wing_name);
        let mut wing_unit = self.load_and_lex(&wing_path, &wing_name)?;
        self.process_unit(&wing_path, &mut wing_unit)?;
        if wing_unit.tokens.len() > 2 {
            self.wings.push(wing_unit);
        }
        Ok(end)
    }
}

/// Reclassifies every `Identifier` token immediately following a
/// `BasicType` or `CustomType` token to `CustomType`, so `Foo x` parses
/// `x` the same way regardless of whether `Foo` is a built-in or a
/// wing-imported class.
fn classify_types_following_type_names(tokens: &mut [Token]) {
    for i in 1..tokens.len() {
        let prev_is_type = matches!(
            tokens[i - 1].kind,
            TokenKind::BasicType | TokenKind::CustomType
        );
        if prev_is_type && tokens[i].kind == TokenKind::Identifier {
            tokens[i].kind = TokenKind::CustomType;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn library_import_is_recorded_and_blanked() {
        let dir = std::env::temp_dir().join(format!("spin-wings-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let main = write_temp(&dir, "main.spin", "import Console;\nInteger x = 1;");
        let mut interner = Interner::new();
        let program = resolve(&main, &mut interner).unwrap();
        assert_eq!(program.libraries, vec![LibraryId::Console]);
        assert!(!program
            .main
            .tokens
            .iter()
            .any(|t| t.kind == TokenKind::ImportKeyword));
    }

    #[test]
    fn missing_semicolon_is_preprocessor_error() {
        let dir = std::env::temp_dir().join(format!("spin-wings-test2-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let main = write_temp(&dir, "main.spin", "import Console");
        let mut interner = Interner::new();
        let err = resolve(&main, &mut interner).unwrap_err();
        assert_eq!(err.code, ErrorCode::Preprocessor);
    }

    #[test]
    fn unreadable_main_file_is_flm_error() {
        let dir = std::env::temp_dir().join(format!("spin-wings-test3-{}", std::process::id()));
        let main = dir.join("does-not-exist.spin");
        let mut interner = Interner::new();
        let err = resolve(&main, &mut interner).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileManagement);
    }

    #[test]
    fn type_classification_reclassifies_following_identifier() {
        let mut interner = Interner::new();
        let tokens = Lexer::new("Integer x;", &mut interner).tokenize();
        let mut tokens = tokens;
        classify_types_following_type_names(&mut tokens);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::CustomType));
    }
}
