//! Crate-wide constants: plan entry names, well-known paths and layer file names.

pub const APP_NAME: &str = "mvnpack";

/// Build plan entry offering or requiring a Maven installation.
pub const PLAN_ENTRY_MAVEN: &str = "maven";
/// Build plan entry for a compiled JVM application package.
pub const PLAN_ENTRY_JVM_APPLICATION_PACKAGE: &str = "jvm-application-package";
pub const PLAN_ENTRY_JDK: &str = "jdk";
pub const PLAN_ENTRY_SYFT: &str = "syft";
pub const PLAN_ENTRY_NODE: &str = "node";
pub const PLAN_ENTRY_YARN: &str = "yarn";

/// Arguments passed to Maven when `BP_MAVEN_BUILD_ARGUMENTS` is not set.
pub const DEFAULT_ARGUMENTS: &[&str] = &["-Dmaven.test.skip=true", "package"];

/// Glob, relative to the application (or module) root, matching built artifacts.
pub const DEFAULT_TARGET: &str = "target/*.[jw]ar";

pub const WRAPPER_SCRIPT: &str = "mvnw";
pub const WRAPPER_PROPERTIES: &str = ".mvn/wrapper/maven-wrapper.properties";
pub const MAVEN_BINARY: &str = "mvn";
pub const DAEMON_BINARY: &str = "mvnd";

/// Dependency ids looked up in the dependency catalog.
pub const MAVEN_DEPENDENCY_ID: &str = "maven";
pub const DAEMON_DEPENDENCY_ID: &str = "mvnd";

/// Binding type carrying `settings.xml` / `settings-security.xml` secrets.
pub const MAVEN_BINDING_TYPE: &str = "maven";
pub const SETTINGS_FILE: &str = "settings.xml";
pub const SETTINGS_SECURITY_FILE: &str = "settings-security.xml";

/// Metadata keys holding settings digests in the application layer fingerprint.
pub const SETTINGS_SHA256_KEY: &str = "settings-sha256";
pub const SETTINGS_SECURITY_SHA256_KEY: &str = "settings-security-sha256";

/// Name of the packaged application inside the application layer.
pub const APPLICATION_ARCHIVE: &str = "application.zip";

/// Assembly descriptor written when multiple artifacts are packaged together.
pub const ASSEMBLY_DESCRIPTOR: &str = "zip.xml";

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const WEB_INF_DIR: &str = "WEB-INF/";
