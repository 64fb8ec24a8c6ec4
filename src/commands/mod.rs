// src/commands/mod.rs
pub mod basename_cmd;
pub mod bool_cmd;
pub mod cat;
pub mod cd_cmd;
pub mod dirname_cmd;
pub mod echo_cmd;
pub mod env_cmd;
pub mod exit_cmd;
pub mod grep;
pub mod head;
pub mod ls;
pub mod mkdir_cmd;
pub mod printf_cmd;
pub mod pwd_cmd;
pub mod registry;
pub mod rm_cmd;
pub mod seq;
pub mod sleep_cmd;
pub mod sort;
pub mod tail;
pub mod touch_cmd;
pub mod types;
pub mod utils;
pub mod wc;
pub mod which_cmd;
pub mod yes_cmd;

use std::sync::Arc;

pub use registry::VirtualRegistry;
pub use types::{
    ByteReceiver, ChunkWriter, Command, CommandContext, CommandResult, Handler, StreamContext,
    StreamingCommand,
};

/// The builtin command set used to seed the registry.
pub(crate) fn builtin_handlers() -> Vec<(&'static str, Handler)> {
    vec![
        ("cat", Handler::Streaming(Arc::new(cat::CatCommand))),
        ("seq", Handler::Streaming(Arc::new(seq::SeqCommand))),
        ("head", Handler::Streaming(Arc::new(head::HeadCommand))),
        ("yes", Handler::Streaming(Arc::new(yes_cmd::YesCommand))),
        ("echo", Handler::Batched(Arc::new(echo_cmd::EchoCommand))),
        ("printf", Handler::Batched(Arc::new(printf_cmd::PrintfCommand))),
        ("pwd", Handler::Batched(Arc::new(pwd_cmd::PwdCommand))),
        ("cd", Handler::Batched(Arc::new(cd_cmd::CdCommand))),
        ("exit", Handler::Batched(Arc::new(exit_cmd::ExitCommand))),
        ("true", Handler::Batched(Arc::new(bool_cmd::TrueCommand))),
        ("false", Handler::Batched(Arc::new(bool_cmd::FalseCommand))),
        ("env", Handler::Batched(Arc::new(env_cmd::EnvCommand))),
        ("which", Handler::Batched(Arc::new(which_cmd::WhichCommand))),
        (
            "basename",
            Handler::Batched(Arc::new(basename_cmd::BasenameCommand)),
        ),
        (
            "dirname",
            Handler::Batched(Arc::new(dirname_cmd::DirnameCommand)),
        ),
        ("sleep", Handler::Batched(Arc::new(sleep_cmd::SleepCommand))),
        ("mkdir", Handler::Batched(Arc::new(mkdir_cmd::MkdirCommand))),
        ("touch", Handler::Batched(Arc::new(touch_cmd::TouchCommand))),
        ("rm", Handler::Batched(Arc::new(rm_cmd::RmCommand))),
        ("ls", Handler::Batched(Arc::new(ls::LsCommand))),
        ("grep", Handler::Batched(Arc::new(grep::GrepCommand))),
        ("sort", Handler::Batched(Arc::new(sort::SortCommand))),
        ("tail", Handler::Batched(Arc::new(tail::TailCommand))),
        ("wc", Handler::Batched(Arc::new(wc::WcCommand))),
    ]
}
