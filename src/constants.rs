//! Common constants used throughout Trellis.

/// Supported configuration file names
pub const CONFIG_FILES: [&str; 3] = ["trellis.json", "trellis.yml", "trellis.yaml"];

/// Compilation mode used for the root node when the caller does not pick one
pub const DEFAULT_MODE: &str = "default";

/// Where the rendered infrastructure specification is written by default
pub const DEFAULT_OUTPUT: &str = "output/infrastructure.yml";

/// Default root of the template store
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Extension of template files inside a tag group
pub const TEMPLATE_EXTENSION: &str = "jinja";

/// Store subdirectory holding one directory per tag
pub const TEMPLATES_SUBDIR: &str = "templates";

/// Store subdirectory holding the shared macro pool
pub const MACROS_SUBDIR: &str = "macros";

/// Attribute under which an element's text content is exposed
pub const TEXT_ATTRIBUTE: &str = "value";

/// Keys that belong to the node itself and can never be attributes
pub const RESERVED_KEYS: [&str; 2] = ["tag", "children"];
