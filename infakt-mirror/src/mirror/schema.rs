use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordSchema {
    pub required: &'static [&'static str],
    pub ignored: &'static [&'static str],
}

impl RecordSchema {
    pub const fn new(required: &'static [&'static str], ignored: &'static [&'static str]) -> Self {
        Self { required, ignored }
    }

    pub fn validate(&self, record: &Value) -> Result<(), String> {
        let Some(object) = record.as_object() else {
            return Err(format!("expected a json object, got {}", type_name(record)));
        };
        let missing: Vec<&str> = self
            .required
            .iter()
            .copied()
            .filter(|field| object.get(*field).is_none_or(Value::is_null))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("missing required fields: {}", missing.join(", ")))
        }
    }

    pub fn normalize(&self, record: &Value) -> Value {
        let mut normalized = record.clone();
        for path in self.ignored {
            let segments: Vec<&str> = path.split('.').collect();
            remove_path(&mut normalized, &segments);
        }
        drop_nulls(&mut normalized);
        normalized
    }
}

fn remove_path(value: &mut Value, path: &[&str]) {
    match value {
        Value::Array(items) => {
            for item in items {
                remove_path(item, path);
            }
        }
        Value::Object(map) => match path {
            [] => {}
            [last] => {
                map.remove(*last);
            }
            [head, rest @ ..] => {
                if let Some(child) = map.get_mut(*head) {
                    remove_path(child, rest);
                }
            }
        },
        _ => {}
    }
}

fn drop_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(drop_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(drop_nulls),
        _ => {}
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
