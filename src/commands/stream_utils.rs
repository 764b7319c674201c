use crate::resp::RespValue;
use crate::stream::{EntryFields, StreamId};

/// Encodes stream entries as the nested reply shape shared by XRANGE and
/// XREAD: `[[id, [field, value, ...]], ...]`.
pub fn entries_to_resp(entries: Vec<(&StreamId, &EntryFields)>) -> RespValue {
    let encoded = entries
        .into_iter()
        .map(|(id, fields)| {
            let mut flat_fields = Vec::with_capacity(fields.len() * 2);

            for (field, value) in fields {
                flat_fields.push(RespValue::BulkString(field.clone()));
                flat_fields.push(RespValue::BulkString(value.clone()));
            }

            RespValue::Array(vec![
                RespValue::BulkString(id.to_string()),
                RespValue::Array(flat_fields),
            ])
        })
        .collect();

    RespValue::Array(encoded)
}
