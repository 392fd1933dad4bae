use std::{
    io::{BufRead, Write},
    sync::mpsc::{channel, RecvTimeoutError},
    thread,
    time::Duration,
};

use crate::{
    app::AppError,
    library::{definitions::DEFAULT_FRAME_INTERVAL, ConfigError},
};

/// Reads one line from `reader`, giving up after `timeout`.
///
/// The read happens on a helper thread. If the deadline passes, that thread is left blocked on
/// the reader and is never joined.
pub fn read_line_with_timeout<R>(reader: R, timeout: Duration) -> Result<String, AppError>
where
    R: BufRead + Send + 'static,
{
    let (line_tx, line_rx) = channel();

    thread::Builder::new()
        .name("interval-prompt".to_string())
        .spawn(move || {
            let mut reader = reader;
            let mut line = String::new();
            let read_result = reader.read_line(&mut line).map(|num_bytes| (num_bytes, line));
            let _ = line_tx.send(read_result);
        })
        .map_err(AppError::PromptRead)?;

    match line_rx.recv_timeout(timeout) {
        Ok(Ok((0, _))) => Err(AppError::PromptClosed),
        Ok(Ok((_, line))) => Ok(line),
        Ok(Err(e)) => Err(AppError::PromptRead(e)),
        Err(RecvTimeoutError::Timeout) => Err(AppError::PromptTimeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(AppError::PromptClosed),
    }
}

/// An empty answer means the default interval of 1.
pub fn parse_interval(input: &str) -> Result<u64, ConfigError> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(DEFAULT_FRAME_INTERVAL);
    }

    match input.parse::<u64>() {
        Ok(interval) if interval >= 1 => Ok(interval),
        _ => Err(ConfigError::InvalidInterval(input.to_string())),
    }
}

pub fn prompt_for_interval<R>(reader: R, timeout: Duration) -> Result<u64, AppError>
where
    R: BufRead + Send + 'static,
{
    print!(
        "Enter the frame interval (default {}, cancelled if nothing is entered within {} seconds): ",
        DEFAULT_FRAME_INTERVAL,
        timeout.as_secs()
    );
    std::io::stdout().flush().map_err(AppError::PromptRead)?;

    let line = read_line_with_timeout(reader, timeout).map_err(|e| {
        //finish the prompt line so that later output starts on a line of its own.
        println!();
        e
    })?;

    Ok(parse_interval(&line)?)
}
