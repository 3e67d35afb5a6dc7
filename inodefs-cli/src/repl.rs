//! Line-oriented command loop.
//!
//! Input is read as raw bytes, one line at a time. Each line is split on
//! spaces and tabs into a command and at most two arguments; any other byte,
//! including non-ASCII and non-UTF-8 ones, belongs to a token. Usage errors
//! are reported before anything reaches the engine.

use std::io::{BufRead, Write};

use inodefs_core::{ContentStore, FileSystem, FsError, ListedEntry};

/// A parsed command line. Names are kept as the bytes typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ls,
    Cd(Vec<u8>),
    Mkdir(Vec<u8>),
    Touch(Vec<u8>),
    Exit,
}

fn is_separator(b: &u8) -> bool {
    *b == b' ' || *b == b'\t'
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`; malformed ones
    /// yield the usage message to print.
    pub fn parse(line: &[u8]) -> Result<Option<Command>, String> {
        let mut tokens = trim_line_ending(line)
            .split(is_separator)
            .filter(|token| !token.is_empty());
        let Some(cmd) = tokens.next() else {
            return Ok(None);
        };
        let arg = tokens.next();
        let extra = tokens.next();

        let command = match (cmd, arg, extra) {
            (b"exit", None, _) => Command::Exit,
            (b"exit", Some(_), _) => return Err("exit: takes no arguments".to_string()),
            (b"ls", None, _) => Command::Ls,
            (b"ls", Some(_), _) => return Err("ls: takes no arguments".to_string()),
            (b"cd", Some(name), None) => Command::Cd(name.to_vec()),
            (b"cd", _, _) => return Err("cd: usage: cd <name>".to_string()),
            (b"mkdir", Some(name), None) => Command::Mkdir(name.to_vec()),
            (b"mkdir", _, _) => return Err("mkdir: usage: mkdir <name>".to_string()),
            (b"touch", Some(name), None) => Command::Touch(name.to_vec()),
            (b"touch", _, _) => return Err("touch: usage: touch <name>".to_string()),
            (other, _, _) => {
                return Err(format!(
                    "Unknown command: {}",
                    String::from_utf8_lossy(other)
                ))
            }
        };
        Ok(Some(command))
    }
}

/// Interactive shell over a mounted filesystem.
pub struct Shell<W: Write, E: Write> {
    out: W,
    err: E,
    /// Print listings as JSON lines.
    pub json: bool,
    /// Print a `> ` prompt before each line.
    pub prompt: bool,
}

impl<W: Write, E: Write> Shell<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            json: false,
            prompt: true,
        }
    }

    /// Read and execute commands until `exit` or end of input.
    ///
    /// Returns an error only when the terminal itself fails: reading input,
    /// or writing to either output stream.
    pub fn run<S: ContentStore, R: BufRead>(
        &mut self,
        fs: &mut FileSystem<S>,
        mut input: R,
    ) -> std::io::Result<()> {
        let mut line = Vec::new();
        loop {
            if self.prompt {
                write!(self.out, "> ")?;
                self.out.flush()?;
            }

            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }

            match Command::parse(&line) {
                Ok(Some(Command::Exit)) => break,
                Ok(Some(command)) => self.execute(fs, command)?,
                Ok(None) => {}
                Err(usage) => writeln!(self.err, "{}", usage)?,
            }
        }
        Ok(())
    }

    /// Run one command, reporting engine errors on the error stream.
    pub fn execute<S: ContentStore>(
        &mut self,
        fs: &mut FileSystem<S>,
        command: Command,
    ) -> std::io::Result<()> {
        let (label, result) = match command {
            Command::Ls => ("ls", self.list(fs)),
            Command::Cd(name) => ("cd", fs.change_directory(&name).map(|_| ())),
            Command::Mkdir(name) => ("mkdir", fs.make_directory(&name).map(|_| ())),
            Command::Touch(name) => ("touch", fs.make_file(&name).map(|_| ())),
            Command::Exit => return Ok(()),
        };

        if let Err(e) = result {
            writeln!(self.err, "{}: {}", label, e)?;
        }
        Ok(())
    }

    fn list<S: ContentStore>(&mut self, fs: &FileSystem<S>) -> Result<(), FsError> {
        for entry in fs.list_directory(fs.cwd())? {
            let listed = ListedEntry::from(&entry?);
            if self.json {
                let line = serde_json::to_string(&listed).map_err(std::io::Error::from)?;
                writeln!(self.out, "{}", line)?;
            } else {
                writeln!(self.out, "{} {}", listed.ino, listed.name)?;
            }
        }
        Ok(())
    }
}

/// Run `shell` over `fs` and then save the inode table.
///
/// The table is saved whether the shell ended normally or on a terminal
/// failure. A save error takes precedence over the shell's error.
pub fn run_session<S: ContentStore, R: BufRead, W: Write, E: Write>(
    mut fs: FileSystem<S>,
    shell: &mut Shell<W, E>,
    input: R,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = shell.run(&mut fs, input);
    fs.shutdown()?;
    result?;
    Ok(())
}
