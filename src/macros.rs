// Diagnostics go through `tracing` when the feature is on and vanish otherwise,
// so call sites stay identical in both builds.

#[cfg(feature = "tracing")]
macro_rules! codec_trace {
    ($($arg:tt)*) => { ::tracing::trace!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! codec_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! codec_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! codec_debug {
    ($($arg:tt)*) => {};
}
