//! Builtin minification stages for JS and CSS.
//!
//! Uses oxc for JavaScript and lightningcss for CSS.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{StageContext, StageError, Transform};

/// JavaScript minify stage.
pub struct MinifyJs;

impl Transform for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, input: &[u8], ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
        let source = std::str::from_utf8(input)?;
        let code = minify_js(source).ok_or_else(|| {
            StageError::Failed(format!(
                "JavaScript parse failed in {}",
                ctx.source.display()
            ))
        })?;
        Ok(code.into_bytes())
    }
}

/// CSS minify stage.
pub struct MinifyCss;

impl Transform for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, input: &[u8], ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
        let source = std::str::from_utf8(input)?;
        let code = minify_css(source).ok_or_else(|| {
            StageError::Failed(format!("CSS parse failed in {}", ctx.source.display()))
        })?;
        Ok(code.into_bytes())
    }
}

/// Minify JavaScript source code.
fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}
