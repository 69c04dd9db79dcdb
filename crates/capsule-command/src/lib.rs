//! Assembles the child JVM invocation: classpath, JVM argument merging,
//! system properties, variable expansion, and environment construction.

pub mod build;
pub mod jvmargs;
pub mod vars;

pub use build::{
    build_command, build_command_with_hooks, BuildContext, ChildCommand, CommandHooks,
    EffectiveAttributes,
};
pub use jvmargs::{jvm_arg_key, merge_keyed, OptionFamily};
pub use vars::{dedup_paths_keep_first, expand_vars, sanitize_archive_relative, ExpansionContext};
