//! Translate `orderByFields` to an ORDER BY clause.

use query_engine_metadata::metadata::LayerMetadata;
use query_engine_sql::sql;

use crate::translation::error::Error;

/// Translate a list such as `name DESC, confidence`. Each field must be a
/// field of the layer or the synthesized object id. Direction defaults to ascending.
pub fn translate_order_by(
    layer: &LayerMetadata,
    order_by_fields: Option<&str>,
) -> Result<sql::ast::OrderBy, Error> {
    let Some(order_by_fields) = order_by_fields else {
        return Ok(sql::helpers::empty_order_by());
    };

    let elements = order_by_fields
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| translate_order_by_element(layer, item))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(sql::ast::OrderBy { elements })
}

fn translate_order_by_element(
    layer: &LayerMetadata,
    item: &str,
) -> Result<sql::ast::OrderByElement, Error> {
    let mut words = item.split_whitespace();
    let (Some(field), direction, None) = (words.next(), words.next(), words.next()) else {
        return Err(Error::invalid_parameter(
            "orderByFields",
            format!("'{item}' is not of the form '<field> [ASC|DESC]'"),
        ));
    };

    let direction = match direction {
        None => sql::ast::OrderByDirection::Asc,
        Some(word) if word.eq_ignore_ascii_case("asc") => sql::ast::OrderByDirection::Asc,
        Some(word) if word.eq_ignore_ascii_case("desc") => sql::ast::OrderByDirection::Desc,
        Some(word) => {
            return Err(Error::invalid_parameter(
                "orderByFields",
                format!("unknown direction '{word}'"),
            ))
        }
    };

    if field != sql::helpers::ROW_ID_COLUMN && layer.lookup_field(field).is_none() {
        return Err(Error::UnknownOrderByField(field.to_string()));
    }

    Ok(sql::ast::OrderByElement {
        target: sql::helpers::make_column_reference(field),
        direction,
    })
}
