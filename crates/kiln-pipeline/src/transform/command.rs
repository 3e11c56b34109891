//! External programs as transform steps (`esbuild`, `lessc`, `sass`, ...).
//!
//! The asset goes to the program's stdin and its stdout replaces the asset.
//! The program runs in the project root.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use kiln_config::CommandStep;

use super::{Asset, Transform, TransformContext};
use crate::error::TransformError;
use crate::listing::slash_path;

pub struct CommandTransform {
    name: String,
    step: CommandStep,
}

impl CommandTransform {
    pub fn new(name: impl Into<String>, step: CommandStep) -> Self {
        Self {
            name: name.into(),
            step,
        }
    }

    fn args(&self, asset: &Asset) -> Vec<String> {
        let path = slash_path(&asset.source);
        self.step
            .args
            .iter()
            .map(|arg| arg.replace("{path}", &path).replace("{ext}", asset.ext()))
            .collect()
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, asset: &mut Asset, ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        let args = self.args(asset);
        tracing::debug!(
            "{}: running {} {}",
            asset.source.display(),
            self.step.command,
            args.join(" ")
        );

        let mut child = Command::new(&self.step.command)
            .args(&args)
            .current_dir(ctx.root())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransformError::Spawn {
                command: self.step.command.clone(),
                source,
            })?;

        // Feed stdin from another thread so a chatty program cannot fill its
        // stdout pipe while we are still writing.
        let input = asset.content.as_bytes();
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(input),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (output, writer.join().unwrap_or(Ok(())))
        });
        let output = output?;

        // A program may exit without draining stdin; its status decides
        if let Err(e) = written {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }

        if !output.status.success() {
            return Err(TransformError::Command {
                command: self.step.command.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        asset.content = String::from_utf8(output.stdout).map_err(|_| TransformError::NotUtf8)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::transform::tests::descriptor_at;

    fn run(step: CommandStep, input: &str) -> Result<String, TransformError> {
        let descriptor = descriptor_at(std::env::temp_dir(), &[]);
        let ctx = TransformContext::new(&descriptor);
        let mut asset = Asset::new("src/app/index.ts", input);
        CommandTransform::new("test", step).apply(&mut asset, &ctx)?;
        Ok(asset.content)
    }

    #[test]
    fn pipes_content_through_program() {
        let out = run(CommandStep::new("tr", &["a-z", "A-Z"]), "let x;\n").unwrap();
        assert_eq!(out, "LET X;\n");
    }

    #[test]
    fn substitutes_placeholders() {
        let step = CommandStep::new("echo", &["{path}", "{ext}"]);
        let out = run(step, "").unwrap();
        assert_eq!(out, "src/app/index.ts ts\n");
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let step = CommandStep::new("sh", &["-c", "echo boom >&2; exit 3"]);
        let err = run(step, "").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Command { status: Some(3), ref stderr, .. } if stderr.contains("boom")
        ));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = run(CommandStep::new("kiln-no-such-program", &[]), "").unwrap_err();
        assert!(matches!(err, TransformError::Spawn { .. }));
    }
}
