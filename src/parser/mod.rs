// Parser module: the syntax-tree provider for the extractors

mod python;

pub use python::PythonParser;
pub(crate) use python::{decorator_names, definition_of, docstring, node_line, node_text};
