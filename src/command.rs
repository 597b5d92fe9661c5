//! Worker command construction.
//!
//! Builds the full argument vector for one thumbnail generator invocation:
//! classpath assembly, `-D` flag propagation with their fallback chains,
//! the optional private temp directory, and the temp properties snapshot
//! the worker reads via `-p`. Flag names and the entry point are the
//! compatibility contract with the worker binary and must match exactly.
//!
//! Construction is deterministic for a given (config, properties, session,
//! filesystem); the only side effects are the two temp artifacts, which
//! the caller owns through [`TempArtifacts`].

use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::props::PropertySet;
use crate::session::Session;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::warn;

/// Property names forwarded to the worker.
pub const CONF_PATH_PROP: &str = "fess.conf.path";
pub const TRANSPORT_ADDRESSES_PROP: &str = "fess.es.transport_addresses";
pub const CLUSTER_NAME_PROP: &str = "fess.es.cluster_name";
pub const LASTA_ENV_PROP: &str = "lasta.env";
pub const LOG_PATH_PROP: &str = "fess.log.path";
pub const LOG_NAME_PROP: &str = "fess.log.name";
pub const LOG_LEVEL_PROP: &str = "fess.log.level";
pub const VAR_PATH_PROP: &str = "fess.var.path";
pub const THUMBNAIL_PATH_PROP: &str = "fess.thumbnail.path";
pub const TMP_DIR_PROP: &str = "java.io.tmpdir";

/// Marker flag declaring a thumbnail-process invocation.
pub const THUMBNAIL_PROCESS_PROP: &str = "fess.thumbnail.process";

/// Fully qualified entry point of the worker.
pub const THUMBNAIL_GENERATOR_CLASS: &str = "org.codelibs.fess.exec.ThumbnailGenerator";

/// A fully built worker invocation: ordered argv plus working directory.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub work_dir: PathBuf,
}

impl CommandSpec {
    /// The executable.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Everything after the executable.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// Temp resources created for one invocation: the properties snapshot file
/// and, when configured, the worker's private temp directory.
///
/// Both are exclusively owned by one job instance and deleted in
/// [`TempArtifacts::cleanup`]. Deletion failures are logged, never fatal.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    prop_file: Option<PathBuf>,
    tmp_dir: Option<PathBuf>,
}

impl TempArtifacts {
    /// Path of the properties snapshot file, while it exists.
    pub fn prop_file(&self) -> Option<&Path> {
        self.prop_file.as_deref()
    }

    /// Path of the private temp directory, while it exists.
    pub fn tmp_dir(&self) -> Option<&Path> {
        self.tmp_dir.as_deref()
    }

    /// Delete both artifacts. Idempotent: a second call is a no-op.
    pub fn cleanup(&mut self) {
        if let Some(path) = self.prop_file.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("failed to delete '{}': {}", path.display(), e);
            }
        }
        if let Some(dir) = self.tmp_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("could not delete a temp dir '{}': {}", dir.display(), e);
            }
        }
    }
}

/// Build the complete worker invocation for a session.
///
/// The returned [`TempArtifacts`] must be cleaned up by the caller once
/// the worker has exited (or failed to start). On error, any artifacts
/// created so far are already cleaned before the error propagates.
pub fn build_command(
    config: &JobConfig,
    props: &PropertySet,
    session: &Session,
) -> Result<(CommandSpec, TempArtifacts)> {
    let cp_separator = if cfg!(windows) { ";" } else { ":" };

    let mut argv = vec![config.java_command_path.clone()];

    argv.push("-cp".to_string());
    argv.push(build_classpath(config, props).join(cp_separator));

    if session.use_locale_elasticsearch {
        if let Some(addresses) = props.get_non_blank(TRANSPORT_ADDRESSES_PROP) {
            argv.push(format!("-D{}={}", TRANSPORT_ADDRESSES_PROP, addresses));
        }
    }

    match props.get_non_blank(CLUSTER_NAME_PROP) {
        Some(name) => argv.push(format!("-D{}={}", CLUSTER_NAME_PROP, name)),
        None => argv.push(format!(
            "-D{}={}",
            CLUSTER_NAME_PROP, config.elasticsearch_cluster_name
        )),
    }

    // Snapshot override wins, with the web environment remapped to the
    // thumbnail one; the session value is the fallback; otherwise omitted.
    match props.get_non_blank(LASTA_ENV_PROP) {
        Some("web") => argv.push(format!("-D{}=thumbnail", LASTA_ENV_PROP)),
        Some(env) => argv.push(format!("-D{}={}", LASTA_ENV_PROP, env)),
        None => {
            if let Some(env) = non_blank(session.lasta_env.as_deref()) {
                argv.push(format!("-D{}={}", LASTA_ENV_PROP, env));
            }
        }
    }

    add_system_property(&mut argv, props, CONF_PATH_PROP, None, None);
    argv.push(format!("-D{}=true", THUMBNAIL_PROCESS_PROP));

    let log_path = session
        .log_file_path
        .clone()
        .or_else(|| props.get(LOG_PATH_PROP).map(PathBuf::from))
        .unwrap_or_else(|| absolute(&config.target_dir.join("logs")));
    argv.push(format!("-D{}={}", LOG_PATH_PROP, log_path.display()));

    add_system_property(&mut argv, props, VAR_PATH_PROP, None, None);
    add_system_property(&mut argv, props, THUMBNAIL_PATH_PROP, None, None);
    add_system_property(&mut argv, props, LOG_NAME_PROP, None, Some("-thumbnail"));

    if let Some(level) = &session.log_level {
        argv.push(format!("-D{}={}", LOG_LEVEL_PROP, level));
    }

    for option in &config.jvm_options {
        if !option.trim().is_empty() {
            argv.push(option.clone());
        }
    }

    let mut artifacts = TempArtifacts::default();

    if config.use_own_tmp_dir {
        let own_tmp_dir = std::env::temp_dir().join(format!("fessTmpDir_{}", session.id));
        match std::fs::create_dir(&own_tmp_dir) {
            Ok(()) => {
                argv.push(format!("-D{}={}", TMP_DIR_PROP, own_tmp_dir.display()));
                artifacts.tmp_dir = Some(own_tmp_dir);
            }
            Err(e) => {
                // Non-fatal: the worker falls back to the shared temp root.
                warn!(
                    "failed to create own temp dir '{}': {}",
                    own_tmp_dir.display(),
                    e
                );
            }
        }
    }

    let result = append_worker_args(&mut argv, props, session, &mut artifacts);
    if let Err(e) = result {
        artifacts.cleanup();
        return Err(e);
    }

    let spec = CommandSpec {
        argv,
        work_dir: absolute(&config.webapp_path),
    };
    Ok((spec, artifacts))
}

/// Classpath entries in fixed order. Relative entries resolve against the
/// webapp root (the worker's working directory); absent directories
/// silently contribute nothing.
fn build_classpath(config: &JobConfig, props: &PropertySet) -> Vec<String> {
    let mut entries = Vec::new();

    if let Some(conf_path) = props.get_non_blank(CONF_PATH_PROP) {
        entries.push(conf_path.to_string());
    }
    entries.push(relative_path(&["WEB-INF", "env", "thumbnail", "resources"]));
    entries.push(relative_path(&["WEB-INF", "classes"]));

    let target_classes = config.target_dir.join("classes");
    if target_classes.is_dir() {
        entries.push(absolute(&target_classes).display().to_string());
    }

    let sep = MAIN_SEPARATOR.to_string();
    append_jar_entries(
        &mut entries,
        &config.webapp_path.join("WEB-INF").join("lib"),
        &(relative_path(&["WEB-INF", "lib"]) + &sep),
    );
    append_jar_entries(
        &mut entries,
        &config
            .webapp_path
            .join("WEB-INF")
            .join("env")
            .join("thumbnail")
            .join("lib"),
        &(relative_path(&["WEB-INF", "env", "thumbnail", "lib"]) + &sep),
    );

    let target_lib = config
        .target_dir
        .join("fess")
        .join("WEB-INF")
        .join("lib");
    if target_lib.is_dir() {
        let base = format!("{}{}", absolute(&target_lib).display(), MAIN_SEPARATOR);
        append_jar_entries(&mut entries, &target_lib, &base);
    }

    entries
}

/// Append `<base><filename>` for every `.jar` file (case-insensitive) in
/// `lib_dir`, sorted by filename. A missing or unreadable directory is not
/// an error: optional plugin directories are legitimately absent.
fn append_jar_entries(entries: &mut Vec<String>, lib_dir: &Path, base: &str) {
    let Ok(dir) = std::fs::read_dir(lib_dir) else {
        return;
    };
    let mut names: Vec<String> = dir
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.to_lowercase().ends_with(".jar"))
        .collect();
    names.sort();
    for name in names {
        entries.push(format!("{}{}", base, name));
    }
}

/// Pass a property through as a `-D` flag when it is set in the snapshot,
/// optionally appending a literal suffix; emit `default_value` when it is
/// not set and a default is given; otherwise emit nothing.
fn add_system_property(
    argv: &mut Vec<String>,
    props: &PropertySet,
    name: &str,
    default_value: Option<&str>,
    append_value: Option<&str>,
) {
    if let Some(value) = props.get(name) {
        let mut flag = format!("-D{}={}", name, value);
        if let Some(suffix) = append_value {
            flag.push_str(suffix);
        }
        argv.push(flag);
    } else if let Some(default) = default_value {
        argv.push(format!("-D{}={}", name, default));
    }
}

/// User JVM options, the worker entry point and its flags, and the `-p`
/// properties snapshot. The snapshot file is the one fatal step: the
/// worker cannot run without its configuration.
fn append_worker_args(
    argv: &mut Vec<String>,
    props: &PropertySet,
    session: &Session,
    artifacts: &mut TempArtifacts,
) -> Result<()> {
    if let Some(options) = non_blank(session.jvm_options.as_deref()) {
        let extra = shell_words::split(options).map_err(|e| {
            JobError::ConfigBuild(format!("failed to parse jvm options '{}': {}", options, e))
        })?;
        argv.extend(extra.into_iter().filter(|s| !s.trim().is_empty()));
    }

    argv.push(THUMBNAIL_GENERATOR_CLASS.to_string());
    argv.push("--sessionId".to_string());
    argv.push(session.id.clone());
    argv.push("--numOfThreads".to_string());
    argv.push(session.num_of_threads.to_string());
    if session.cleanup {
        argv.push("--cleanup".to_string());
    }

    let prop_file = write_property_snapshot(props, argv)?;
    argv.push("-p".to_string());
    argv.push(prop_file.display().to_string());
    artifacts.prop_file = Some(prop_file);

    Ok(())
}

/// Write the full property snapshot to a fresh temp file the worker reads
/// once and the job deletes after exit.
fn write_property_snapshot(props: &PropertySet, argv: &[String]) -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("thumbnail_")
        .suffix(".properties")
        .tempfile()
        .map_err(|e| {
            JobError::ConfigBuild(format!("failed to create a temp properties file: {}", e))
        })?;

    props
        .store_to(file.as_file(), Some(&format!("{:?}", argv)))
        .map_err(|e| {
            JobError::ConfigBuild(format!(
                "failed to write the temp properties file '{}': {}",
                file.path().display(),
                e
            ))
        })?;

    let (_, path) = file.keep().map_err(|e| {
        JobError::ConfigBuild(format!("failed to keep the temp properties file: {}", e))
    })?;
    Ok(path)
}

fn relative_path(parts: &[&str]) -> String {
    parts.join(&MAIN_SEPARATOR.to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::generate_session_id;
    use tempfile::TempDir;

    fn make_session() -> Session {
        Session {
            id: generate_session_id(),
            num_of_threads: 1,
            cleanup: false,
            log_file_path: None,
            log_level: None,
            jvm_options: None,
            lasta_env: None,
            use_locale_elasticsearch: true,
        }
    }

    fn make_config(temp_dir: &TempDir) -> JobConfig {
        JobConfig {
            java_command_path: "java".to_string(),
            webapp_path: temp_dir.path().join("app"),
            target_dir: temp_dir.path().join("target"),
            elasticsearch_cluster_name: "fess-es".to_string(),
            use_own_tmp_dir: false,
            jvm_options: vec![],
        }
    }

    fn build(
        config: &JobConfig,
        props: &PropertySet,
        session: &Session,
    ) -> (CommandSpec, TempArtifacts) {
        build_command(config, props, session).unwrap()
    }

    fn classpath(spec: &CommandSpec) -> String {
        assert_eq!(spec.argv[1], "-cp");
        spec.argv[2].clone()
    }

    fn has_flag(spec: &CommandSpec, flag: &str) -> bool {
        spec.argv.iter().any(|a| a == flag)
    }

    #[test]
    fn argv_starts_with_java_command() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());

        assert_eq!(spec.program(), "java");
        assert_eq!(spec.argv[1], "-cp");
        artifacts.cleanup();
    }

    #[test]
    fn classpath_includes_jars_from_existing_dirs_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        // One lib dir exists with a mixed-case jar and a non-jar; the
        // thumbnail lib dir is absent from disk entirely.
        let lib_dir = config.webapp_path.join("WEB-INF").join("lib");
        std::fs::create_dir_all(&lib_dir).unwrap();
        std::fs::write(lib_dir.join("a.JAR"), b"").unwrap();
        std::fs::write(lib_dir.join("b.jar"), b"").unwrap();
        std::fs::write(lib_dir.join("readme.txt"), b"").unwrap();

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        let cp = classpath(&spec);

        let lib_base = ["WEB-INF", "lib"].join(&MAIN_SEPARATOR.to_string());
        assert!(cp.contains(&format!("{}{}a.JAR", lib_base, MAIN_SEPARATOR)));
        assert!(cp.contains(&format!("{}{}b.jar", lib_base, MAIN_SEPARATOR)));
        assert!(!cp.contains("readme.txt"));
        assert!(!cp.contains(&["env", "thumbnail", "lib"].join(&MAIN_SEPARATOR.to_string())));
        artifacts.cleanup();
    }

    #[test]
    fn classpath_has_fixed_entries_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let mut props = PropertySet::new();
        props.set(CONF_PATH_PROP, "/opt/fess/conf");

        let (spec, mut artifacts) = build(&config, &props, &make_session());
        let cp = classpath(&spec);
        let sep = if cfg!(windows) { ';' } else { ':' };
        let entries: Vec<&str> = cp.split(sep).collect();

        assert_eq!(entries[0], "/opt/fess/conf");
        assert_eq!(
            entries[1],
            ["WEB-INF", "env", "thumbnail", "resources"].join(&MAIN_SEPARATOR.to_string())
        );
        assert_eq!(entries[2], ["WEB-INF", "classes"].join(&MAIN_SEPARATOR.to_string()));
        artifacts.cleanup();
    }

    #[test]
    fn classpath_includes_target_classes_only_when_present() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(!classpath(&spec).contains(&config.target_dir.join("classes").display().to_string()));
        artifacts.cleanup();

        std::fs::create_dir_all(config.target_dir.join("classes")).unwrap();
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(classpath(&spec).contains(&config.target_dir.join("classes").display().to_string()));
        artifacts.cleanup();
    }

    #[test]
    fn cluster_name_prefers_property_override() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(has_flag(&spec, "-Dfess.es.cluster_name=fess-es"));
        artifacts.cleanup();

        let mut props = PropertySet::new();
        props.set(CLUSTER_NAME_PROP, "other-cluster");
        let (spec, mut artifacts) = build(&config, &props, &make_session());
        assert!(has_flag(&spec, "-Dfess.es.cluster_name=other-cluster"));
        assert!(!has_flag(&spec, "-Dfess.es.cluster_name=fess-es"));
        artifacts.cleanup();
    }

    #[test]
    fn transport_addresses_follow_locale_flag() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let mut props = PropertySet::new();
        props.set(TRANSPORT_ADDRESSES_PROP, "localhost:9300");

        let (spec, mut artifacts) = build(&config, &props, &make_session());
        assert!(has_flag(&spec, "-Dfess.es.transport_addresses=localhost:9300"));
        artifacts.cleanup();

        let mut session = make_session();
        session.use_locale_elasticsearch = false;
        let (spec, mut artifacts) = build(&config, &props, &session);
        assert!(!has_flag(&spec, "-Dfess.es.transport_addresses=localhost:9300"));
        artifacts.cleanup();

        // Blank property contributes nothing even with the flag on.
        let mut props = PropertySet::new();
        props.set(TRANSPORT_ADDRESSES_PROP, "  ");
        let (spec, mut artifacts) = build(&config, &props, &make_session());
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Dfess.es.transport_addresses=")));
        artifacts.cleanup();
    }

    #[test]
    fn lasta_env_web_override_remaps_to_thumbnail() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let mut props = PropertySet::new();
        props.set(LASTA_ENV_PROP, "web");

        let (spec, mut artifacts) = build(&config, &props, &make_session());
        assert!(has_flag(&spec, "-Dlasta.env=thumbnail"));
        artifacts.cleanup();
    }

    #[test]
    fn lasta_env_other_override_passes_through() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let mut props = PropertySet::new();
        props.set(LASTA_ENV_PROP, "staging");

        let mut session = make_session();
        session.lasta_env = Some("ignored".to_string());
        let (spec, mut artifacts) = build(&config, &props, &session);
        assert!(has_flag(&spec, "-Dlasta.env=staging"));
        assert!(!has_flag(&spec, "-Dlasta.env=ignored"));
        artifacts.cleanup();
    }

    #[test]
    fn lasta_env_falls_back_to_session_value() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let mut session = make_session();
        session.lasta_env = Some("thumbnail".to_string());
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &session);
        assert!(has_flag(&spec, "-Dlasta.env=thumbnail"));
        artifacts.cleanup();
    }

    #[test]
    fn lasta_env_omitted_when_both_absent() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Dlasta.env=")));
        artifacts.cleanup();
    }

    #[test]
    fn thumbnail_process_marker_always_present() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(has_flag(&spec, "-Dfess.thumbnail.process=true"));
        artifacts.cleanup();
    }

    #[test]
    fn log_path_fallback_chain() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        // Session value wins.
        let mut session = make_session();
        session.log_file_path = Some(PathBuf::from("/var/log/fess"));
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &session);
        assert!(has_flag(&spec, "-Dfess.log.path=/var/log/fess"));
        artifacts.cleanup();

        // Then the property snapshot.
        let mut props = PropertySet::new();
        props.set(LOG_PATH_PROP, "/opt/fess/logs");
        let (spec, mut artifacts) = build(&config, &props, &make_session());
        assert!(has_flag(&spec, "-Dfess.log.path=/opt/fess/logs"));
        artifacts.cleanup();

        // Then the default under the build output dir.
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        let expected = format!("-Dfess.log.path={}", config.target_dir.join("logs").display());
        assert!(has_flag(&spec, &expected));
        artifacts.cleanup();
    }

    #[test]
    fn optional_path_properties_pass_through_when_set() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let mut props = PropertySet::new();
        props.set(VAR_PATH_PROP, "/var/lib/fess");
        props.set(THUMBNAIL_PATH_PROP, "/var/lib/fess/thumbnails");
        props.set(LOG_NAME_PROP, "fess");

        let (spec, mut artifacts) = build(&config, &props, &make_session());
        assert!(has_flag(&spec, "-Dfess.var.path=/var/lib/fess"));
        assert!(has_flag(&spec, "-Dfess.thumbnail.path=/var/lib/fess/thumbnails"));
        // Log name gets the fixed suffix when emitted.
        assert!(has_flag(&spec, "-Dfess.log.name=fess-thumbnail"));
        artifacts.cleanup();

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Dfess.var.path=")));
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Dfess.thumbnail.path=")));
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Dfess.log.name=")));
        artifacts.cleanup();
    }

    #[test]
    fn log_level_emitted_only_when_set() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let mut session = make_session();
        session.log_level = Some("debug".to_string());
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &session);
        assert!(has_flag(&spec, "-Dfess.log.level=debug"));
        artifacts.cleanup();

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Dfess.log.level=")));
        artifacts.cleanup();
    }

    #[test]
    fn default_jvm_options_skip_blank_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = make_config(&temp_dir);
        config.jvm_options = vec![
            "-Xmx256m".to_string(),
            "  ".to_string(),
            "-Djava.awt.headless=true".to_string(),
        ];

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(has_flag(&spec, "-Xmx256m"));
        assert!(has_flag(&spec, "-Djava.awt.headless=true"));
        assert!(!spec.argv.iter().any(|a| a == "  "));
        artifacts.cleanup();
    }

    #[test]
    fn session_jvm_options_are_shell_split() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let mut session = make_session();
        session.jvm_options = Some("-Xdebug -Xmx512m".to_string());
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &session);
        assert!(has_flag(&spec, "-Xdebug"));
        assert!(has_flag(&spec, "-Xmx512m"));
        artifacts.cleanup();
    }

    #[test]
    fn unparseable_jvm_options_are_a_build_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let mut session = make_session();
        session.jvm_options = Some("-Dbad=\"unterminated".to_string());
        let result = build_command(&config, &PropertySet::new(), &session);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("jvm options"));
    }

    #[test]
    fn worker_args_trail_the_entry_point() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let mut session = make_session();
        session.id = "abcDEFghiJKLmno".to_string();
        session.num_of_threads = 3;
        session.cleanup = true;
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &session);

        let class_pos = spec
            .argv
            .iter()
            .position(|a| a == THUMBNAIL_GENERATOR_CLASS)
            .unwrap();
        assert_eq!(spec.argv[class_pos + 1], "--sessionId");
        assert_eq!(spec.argv[class_pos + 2], "abcDEFghiJKLmno");
        assert_eq!(spec.argv[class_pos + 3], "--numOfThreads");
        assert_eq!(spec.argv[class_pos + 4], "3");
        assert_eq!(spec.argv[class_pos + 5], "--cleanup");
        artifacts.cleanup();
    }

    #[test]
    fn cleanup_flag_omitted_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(!has_flag(&spec, "--cleanup"));
        artifacts.cleanup();
    }

    #[test]
    fn property_snapshot_is_written_and_referenced() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);
        let mut props = PropertySet::new();
        props.set("fess.log.name", "fess");
        props.set("custom.key", "custom value");

        let (spec, mut artifacts) = build(&config, &props, &make_session());

        let p_pos = spec.argv.iter().position(|a| a == "-p").unwrap();
        let snapshot_path = PathBuf::from(&spec.argv[p_pos + 1]);
        assert_eq!(artifacts.prop_file(), Some(snapshot_path.as_path()));
        assert!(snapshot_path.exists());

        let stored = PropertySet::load(&snapshot_path).unwrap();
        assert_eq!(stored, props);

        artifacts.cleanup();
        assert!(!snapshot_path.exists());
    }

    #[test]
    fn own_tmp_dir_created_and_flagged_when_configured() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = make_config(&temp_dir);
        config.use_own_tmp_dir = true;

        let mut session = make_session();
        session.id = format!("tmpDirTest{}", std::process::id());
        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &session);

        let own_tmp = std::env::temp_dir().join(format!("fessTmpDir_{}", session.id));
        assert!(own_tmp.is_dir());
        assert!(has_flag(&spec, &format!("-Djava.io.tmpdir={}", own_tmp.display())));
        assert_eq!(artifacts.tmp_dir(), Some(own_tmp.as_path()));

        artifacts.cleanup();
        assert!(!own_tmp.exists());
    }

    #[test]
    fn own_tmp_dir_skipped_when_not_configured() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert!(!spec.argv.iter().any(|a| a.starts_with("-Djava.io.tmpdir=")));
        assert!(artifacts.tmp_dir().is_none());
        artifacts.cleanup();
    }

    #[test]
    fn work_dir_is_the_webapp_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        assert_eq!(spec.work_dir, config.webapp_path);
        artifacts.cleanup();
    }

    #[test]
    fn artifacts_cleanup_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = make_config(&temp_dir);

        let (_spec, mut artifacts) = build(&config, &PropertySet::new(), &make_session());
        artifacts.cleanup();
        // Second call must be a no-op, not an error.
        artifacts.cleanup();
        assert!(artifacts.prop_file().is_none());
        assert!(artifacts.tmp_dir().is_none());
    }

    #[test]
    fn add_system_property_default_and_suffix() {
        let mut argv = Vec::new();
        let mut props = PropertySet::new();
        props.set("some.prop", "value");

        add_system_property(&mut argv, &props, "some.prop", None, Some("-suffix"));
        add_system_property(&mut argv, &props, "missing.prop", Some("fallback"), None);
        add_system_property(&mut argv, &props, "absent.prop", None, None);

        assert_eq!(argv, vec!["-Dsome.prop=value-suffix", "-Dmissing.prop=fallback"]);
    }
}
