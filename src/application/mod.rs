// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for each user-facing command:
//
//   train   — fit one pipeline and save it
//   tune    — run the concurrent hyperparameter search
//   predict — load a saved pipeline and label new titles
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1); use cases return
//     summaries for the CLI to render
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Ingest → label → split, shared by train and tune
pub mod prepare;

/// Single pipeline training
pub mod train_use_case;

/// Hyperparameter search
pub mod tune_use_case;

/// Prediction from a saved snapshot
pub mod predict_use_case;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::{fs, path::{Path, PathBuf}};

    /// Write `n` posts where the popular half always mentions
    /// "amazing" and the rest always mention "boring".
    pub fn write_posts(dir: &Path, name: &str, n: usize) -> PathBuf {
        let lines: Vec<String> = (0..n)
            .map(|i| {
                let (title, score) = if i % 2 == 0 {
                    (format!("amazing great story {}", i % 5), 100 + i)
                } else {
                    (format!("boring dull post {}", i % 5), i)
                };
                serde_json::json!({"kind": "t3", "data": {"title": title, "score": score}})
                    .to_string()
            })
            .collect();

        let path = dir.join(name);
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }
}
