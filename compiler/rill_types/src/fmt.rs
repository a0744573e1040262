//! Type rendering for diagnostics.

use rill_ir::{StringInterner, TypeId};

use crate::data::TypeData;
use crate::interner::TypeInterner;

/// Render a type for a diagnostic message.
pub fn format_type(types: &TypeInterner, strings: &StringInterner, id: TypeId) -> String {
    match types.lookup(id) {
        TypeData::Void => "void".to_string(),
        TypeData::Bool => "bool".to_string(),
        TypeData::Int => "int".to_string(),
        TypeData::Long => "long".to_string(),
        TypeData::Double => "double".to_string(),
        TypeData::String => "string".to_string(),
        TypeData::Principal => "principal".to_string(),
        TypeData::Date => "date".to_string(),
        TypeData::Maybe(inner) => format!("maybe<{}>", format_type(types, strings, *inner)),
        TypeData::List(elem) => format!("list<{}>", format_type(types, strings, *elem)),
        TypeData::Map(key, value) => format!(
            "map<{}, {}>",
            format_type(types, strings, *key),
            format_type(types, strings, *value)
        ),
        TypeData::Pair(left, right) => format!(
            "pair<{}, {}>",
            format_type(types, strings, *left),
            format_type(types, strings, *right)
        ),
        TypeData::Tuple(elems) => {
            let inner: Vec<String> = elems
                .iter()
                .map(|e| format_type(types, strings, *e))
                .collect();
            format!("({})", inner.join(", "))
        }
        TypeData::Message { name: Some(name), .. } => strings.resolve(*name).to_string(),
        TypeData::Message { name: None, fields } => {
            let inner: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{}: {}",
                        strings.resolve(f.name),
                        format_type(types, strings, f.ty)
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        TypeData::Enum(name) => strings.resolve(*name).to_string(),
        TypeData::Func(func) => {
            let params: Vec<String> = func
                .params
                .iter()
                .map(|p| format_type(types, strings, *p))
                .collect();
            format!(
                "func({}) -> {}",
                params.join(", "),
                format_type(types, strings, func.ret)
            )
        }
    }
}
