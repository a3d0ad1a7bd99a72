// ABOUTME: openab command-line front end over the agent dispatcher
// ABOUTME: Argument parsing and command execution live in `cli`

pub mod cli;
