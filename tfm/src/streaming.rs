use std::io::{BufRead, BufReader, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::console;
use crate::format::ansi;

const PRINT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn name(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }

    fn tag(self) -> String {
        match self {
            OutputStream::Stdout => ansi::blue("[cmd]"),
            OutputStream::Stderr => ansi::red("[err]"),
        }
    }
}

#[derive(Debug)]
pub struct CapturedStreams {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub fn decorate_line(stream: OutputStream, line: &str) -> String {
    format!("{} {line}", stream.tag())
}

fn normalize_crlf_line(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Reads `reader` line by line until EOF, returning every line followed by
/// `\n`. When `relay` is present each line is also queued for printing.
pub fn pump_lines(
    reader: impl std::io::Read,
    stream: OutputStream,
    relay: Option<mpsc::SyncSender<(OutputStream, String)>>,
) -> String {
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut raw: Vec<u8> = vec![];
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                console::debug(&format!("{} pump stopped early: {err}", stream.name()));
                break;
            }
        }
        let decoded = String::from_utf8_lossy(&raw);
        let decoded: &str = &decoded;
        let line = normalize_crlf_line(decoded.strip_suffix('\n').unwrap_or(decoded));
        captured.push_str(line);
        captured.push('\n');
        if let Some(tx) = relay.as_ref() {
            // The printer only goes away if stdout is gone; keep capturing regardless.
            let _ = tx.send((stream, line.to_string()));
        }
    }
    captured
}

fn spawn_pump_thread(
    reader: os_pipe::PipeReader,
    stream: OutputStream,
    relay: Option<mpsc::SyncSender<(OutputStream, String)>>,
) -> JoinHandle<String> {
    std::thread::spawn(move || pump_lines(reader, stream, relay))
}

fn spawn_printer_thread(rx: mpsc::Receiver<(OutputStream, String)>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let stdout = std::io::stdout();
        rx.into_iter().for_each(|(stream, line)| {
            let mut lock = stdout.lock();
            let _ = writeln!(lock, "{}", decorate_line(stream, &line));
        });
    })
}

fn join_pump_thread(handle: JoinHandle<String>) -> std::io::Result<String> {
    handle
        .join()
        .map_err(|_| std::io::Error::other("output pump thread panicked"))
}

/// Runs `command` with stdout and stderr on separate pipes, draining both
/// concurrently. Relayed lines go through a single printer so each console
/// write is one whole line; order is kept within a stream only.
pub fn run_pipe_capture(mut command: Command, relay: bool) -> std::io::Result<CapturedStreams> {
    // Explicit pipes so the parent never keeps a write end open; otherwise the
    // pumps would wait forever for EOF.
    let (stdout_reader, stdout_writer) = os_pipe::pipe()?;
    let (stderr_reader, stderr_writer) = os_pipe::pipe()?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_writer))
        .stderr(Stdio::from(stderr_writer));
    let spawned = command.spawn();
    drop(command);
    let mut child = spawned?;

    let (tx, rx) = mpsc::sync_channel::<(OutputStream, String)>(PRINT_QUEUE_CAPACITY);
    let printer = spawn_printer_thread(rx);
    let stdout_pump = spawn_pump_thread(
        stdout_reader,
        OutputStream::Stdout,
        relay.then(|| tx.clone()),
    );
    let stderr_pump = spawn_pump_thread(
        stderr_reader,
        OutputStream::Stderr,
        relay.then(|| tx.clone()),
    );
    drop(tx);

    let waited = child.wait();
    // Pipes may still hold data written just before exit.
    let stdout = join_pump_thread(stdout_pump);
    let stderr = join_pump_thread(stderr_pump);
    let _ = printer.join();

    Ok(CapturedStreams {
        status: waited?,
        stdout: stdout?,
        stderr: stderr?,
    })
}
