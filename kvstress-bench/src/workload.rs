use kvstress_common::OpKind;

/// Member name for logical request `index`: the key followed by the index.
pub fn member(key: &str, index: u64) -> String {
    format!("{key}{index}")
}

/// Arguments sent with `op` for logical request `index`.
///
/// All operations target the collection named `key`. `zadd` uses the index
/// as the score so a later `zscore`/`zrank` run over the same range hits
/// every member it inserted.
pub fn command_args(op: OpKind, key: &str, index: u64) -> Vec<String> {
    let member = member(key, index);
    match op {
        OpKind::Zadd => vec![key.to_string(), index.to_string(), member],
        OpKind::Sadd
        | OpKind::Srem
        | OpKind::Sismember
        | OpKind::Zrem
        | OpKind::Zrank
        | OpKind::Zscore => vec![key.to_string(), member],
    }
}
