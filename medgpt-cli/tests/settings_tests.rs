//! Settings layering: defaults < file < environment < flags.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use medgpt_cli::GlobalArgs;
use medgpt_cli::settings::{DEFAULT_INDEX_DIR, FileSettings, KeySource, Settings};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn defaults_follow_the_hosted_setup() {
    let settings =
        Settings::resolve_with_vars(FileSettings::default(), &HashMap::new(), &GlobalArgs::default())
            .unwrap();

    assert_eq!(settings.index_dir, PathBuf::from(DEFAULT_INDEX_DIR));
    assert_eq!(settings.model, "llama3-70b-8192");
    assert_eq!(settings.temperature, 0.7);
    assert_eq!(settings.max_tokens, 3000);
    assert_eq!(settings.retrieval.top_k, 1);
    assert_eq!(settings.embedding.model, "BAAI/bge-large-en");
    assert_eq!(settings.embedding.dimensions, 1024);
    assert!(settings.api_key.is_none());
    assert!(settings.api_key_source.is_none());
    assert!(!settings.require_nonblank_context);
}

#[test]
fn file_values_apply_and_unset_tables_keep_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
index_dir = "books"
model = "llama3-8b-8192"
max_tokens = 1024
require_nonblank_context = true

[retrieval]
top_k = 2
similarity_threshold = 0.25

[embedding]
url = "http://embeddings.internal/v1"
dimensions = 768
"#
    )
    .unwrap();

    let loaded = FileSettings::load(file.path()).unwrap();
    let settings = Settings::resolve_with_vars(loaded, &HashMap::new(), &GlobalArgs::default()).unwrap();

    assert_eq!(settings.index_dir, PathBuf::from("books"));
    assert_eq!(settings.model, "llama3-8b-8192");
    assert_eq!(settings.max_tokens, 1024);
    assert_eq!(settings.temperature, 0.7);
    assert!(settings.require_nonblank_context);
    assert_eq!(settings.retrieval.top_k, 2);
    assert_eq!(settings.retrieval.similarity_threshold, Some(0.25));
    assert_eq!(settings.retrieval.collection, "medical_books");
    assert_eq!(settings.embedding.url, "http://embeddings.internal/v1");
    assert_eq!(settings.embedding.dimensions, 768);
}

#[test]
fn unknown_keys_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "modle = \"typo\"").unwrap();

    assert!(FileSettings::load(file.path()).is_err());
}

#[test]
fn environment_overrides_file_and_flags_override_environment() {
    let file = FileSettings {
        index_dir: Some("from-file".into()),
        api_key: Some("file-key".into()),
        ..FileSettings::default()
    };
    let env = vars(&[
        ("GROQ_API_KEY", "env-key"),
        ("MEDGPT_INDEX_DIR", "from-env"),
        ("MEDGPT_EMBEDDING_MODEL", "BAAI/bge-small-en"),
    ]);

    let settings = Settings::resolve_with_vars(file.clone(), &env, &GlobalArgs::default()).unwrap();
    assert_eq!(settings.api_key.as_deref(), Some("env-key"));
    assert_eq!(settings.api_key_source, Some(KeySource::Environment));
    assert_eq!(settings.index_dir, PathBuf::from("from-env"));
    assert_eq!(settings.embedding.model, "BAAI/bge-small-en");

    let args = GlobalArgs {
        api_key: Some("flag-key".into()),
        index_dir: Some("from-flag".into()),
        model: Some("mixtral-8x7b-32768".into()),
        ..GlobalArgs::default()
    };
    let settings = Settings::resolve_with_vars(file, &env, &args).unwrap();
    assert_eq!(settings.api_key.as_deref(), Some("flag-key"));
    assert_eq!(settings.api_key_source, Some(KeySource::Flag));
    assert_eq!(settings.index_dir, PathBuf::from("from-flag"));
    assert_eq!(settings.model, "mixtral-8x7b-32768");
}

#[test]
fn blank_keys_count_as_missing() {
    let file = FileSettings { api_key: Some("  ".into()), ..FileSettings::default() };
    let args = GlobalArgs { api_key: Some(String::new()), ..GlobalArgs::default() };

    let settings = Settings::resolve_with_vars(file, &vars(&[("GROQ_API_KEY", " ")]), &args).unwrap();

    assert!(settings.api_key.is_none());
}

#[test]
fn file_key_is_used_last() {
    let file = FileSettings { api_key: Some("file-key".into()), ..FileSettings::default() };

    let settings = Settings::resolve_with_vars(file, &HashMap::new(), &GlobalArgs::default()).unwrap();

    assert_eq!(settings.api_key_source, Some(KeySource::ConfigFile));
}

#[test]
fn invalid_retrieval_table_is_an_error() {
    let file = FileSettings {
        retrieval: Some(medgpt_rag::RetrievalConfig { top_k: 0, ..Default::default() }),
        ..FileSettings::default()
    };

    assert!(Settings::resolve_with_vars(file, &HashMap::new(), &GlobalArgs::default()).is_err());
}

#[test]
fn debug_output_hides_keys() {
    let args = GlobalArgs { api_key: Some("gsk_very_secret".into()), ..GlobalArgs::default() };
    let settings = Settings::resolve_with_vars(FileSettings::default(), &HashMap::new(), &args).unwrap();

    assert!(!format!("{settings:?}").contains("gsk_very_secret"));
}
