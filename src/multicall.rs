//! Multicall dispatch.
//!
//! The binary is installed under several names (symlinks). The basename it
//! was invoked as picks the behavior:
//!
//! ```text
//! kube-torcx-bootstrap [flags]      -> Bootstrap
//! kube-torcx-hook-pre [flags]       -> HookPre
//! kube-torcx bootstrap [flags]      -> Bootstrap (bare tool name)
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use tracing::level_filters::LevelFilter;

use crate::commands::{Behavior, BehaviorKind};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::flags;
use crate::logging::{LevelSink, DEFAULT_LEVEL};
use crate::validate;

/// Name of the binary itself.
pub const TOOL_NAME: &str = "kube-torcx";

type HandlerFactory<'a> = Box<dyn Fn(BehaviorKind) -> Box<dyn Behavior> + 'a>;

/// Routes an invocation to its behavior.
pub struct Dispatcher<'a> {
    registry: BTreeMap<&'static str, BehaviorKind>,
    levels: &'a dyn LevelSink,
    handlers: HandlerFactory<'a>,
}

impl<'a> Dispatcher<'a> {
    /// Set the default log level and register every known behavior.
    pub fn init(levels: &'a dyn LevelSink) -> Result<Self> {
        levels.set_level(DEFAULT_LEVEL);

        let mut registry = BTreeMap::new();
        for kind in BehaviorKind::ALL {
            register(&mut registry, kind.name(), kind)?;
        }

        Ok(Self {
            registry,
            levels,
            handlers: Box::new(BehaviorKind::handler),
        })
    }

    /// Replace the production handlers.
    pub fn with_handlers(mut self, handlers: impl Fn(BehaviorKind) -> Box<dyn Behavior> + 'a) -> Self {
        self.handlers = Box::new(handlers);
        self
    }

    /// Registered invocation names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.keys().copied()
    }

    /// Work out which behavior `argv` asks for.
    ///
    /// Returns the behavior and the arguments to bind, starting with the
    /// program name.
    pub fn select<I, T>(&self, argv: I) -> Result<(BehaviorKind, Vec<OsString>)>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let invoked = argv
            .first()
            .and_then(|arg0| Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if invoked == TOOL_NAME {
            let Some(requested) = argv.get(1) else {
                return Err(Error::UnknownBehavior(invoked));
            };
            let requested = requested.to_string_lossy();
            let kind = self
                .registry
                .get(requested.as_ref())
                .copied()
                .or_else(|| {
                    BehaviorKind::ALL
                        .into_iter()
                        .find(|k| k.short_name() == requested)
                })
                .ok_or_else(|| Error::UnknownBehavior(requested.into_owned()))?;
            return Ok((kind, argv[1..].to_vec()));
        }

        match self.registry.get(invoked.as_str()) {
            Some(kind) => Ok((*kind, argv)),
            None => Err(Error::UnknownBehavior(invoked)),
        }
    }

    /// Bind and resolve the configuration for `kind`.
    pub fn prepare(&self, kind: BehaviorKind, args: Vec<OsString>) -> Result<Config> {
        let flags = flags::bind(kind.name(), kind.about(), args)?;
        validate::resolve(&flags, kind.default_version_manifest(), self.levels)
    }

    /// Select, resolve, then run. Nothing runs unless resolution succeeds.
    pub fn dispatch<I, T>(&self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (kind, args) = self.select(argv)?;
        let config = self.prepare(kind, args)?;

        if config.verbosity >= LevelFilter::DEBUG {
            config.print();
        }

        tracing::debug!(behavior = kind.name(), "dispatching");
        (self.handlers)(kind).run(&config)?;
        Ok(())
    }
}

fn register(
    registry: &mut BTreeMap<&'static str, BehaviorKind>,
    name: &'static str,
    kind: BehaviorKind,
) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Registration(format!("{:?} has an empty name", kind)));
    }
    if let Some(existing) = registry.insert(name, kind) {
        return Err(Error::Registration(format!(
            "{:?} and {:?} both registered as {:?}",
            existing, kind, name
        )));
    }
    Ok(())
}
