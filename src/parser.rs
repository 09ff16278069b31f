use crate::caption::CaptionId;
use crate::error::SubsyncError;
use crate::script::{CaptionSpec, Command};

use std::time::Duration;

use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{digit1, line_ending, space0, space1};
use nom::combinator::{map, map_res, opt, peek, value};
use nom::error::{context, convert_error, ErrorKind, VerboseError};
use nom::number::complete::double;
use nom::sequence::preceded;
use nom::{branch::alt, error_position, Err, IResult};

pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    pub fn parse(&mut self, input: &str) -> Result<Vec<Command>, SubsyncError> {
        match script(input) {
            Ok((_, commands)) => Ok(commands),
            Err(Err::Error(err)) | Err(Err::Failure(err)) => {
                Err(SubsyncError::ParseError(convert_error(input, err)))
            }
            Err(Err::Incomplete(_)) => {
                unreachable!("Incomplete data received by non-streaming parser.")
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn optional_bom(input: &str) -> Res<Option<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn script(input: &str) -> Res<Vec<Command>> {
    let (mut input, _) = optional_bom(input)?;
    let mut commands = Vec::new();
    while !input.is_empty() {
        let (rem_input, command) = script_line(input)?;
        if let Some(command) = command {
            commands.push(command);
        }
        input = rem_input;
    }
    Ok((input, commands))
}

fn script_line(input: &str) -> Res<Option<Command>> {
    let (input, _) = space0(input)?;
    let (input, command) = alt((
        value(None, blank),
        map(context("command", command), Some),
    ))(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = opt(comment)(input)?;
    let (input, _) = context("end of line", alt((line_ending, end_of_file)))(input)?;
    Ok((input, command))
}

fn end_of_file(input: &str) -> Res<&str> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn blank(input: &str) -> Res<&str> {
    peek(alt((line_ending, tag("#"), end_of_file)))(input)
}

fn comment(input: &str) -> Res<&str> {
    preceded(tag("#"), rest_of_line)(input)
}

fn rest_of_line(input: &str) -> Res<&str> {
    take_while(|c: char| c != '\n' && c != '\r')(input)
}

fn command(input: &str) -> Res<Command> {
    alt((
        map(caption_spec("caption"), Command::Caption),
        map(caption_spec("add"), Command::Add),
        map(preceded(tag("remove"), preceded(space1, caption_id)), Command::Remove),
        times,
        value(Command::ClearTimes, tag("clear-times")),
        value(Command::Clear, tag("clear")),
        value(Command::Mute(true), tag("mute")),
        value(Command::Mute(false), tag("unmute")),
        map(preceded(tag("at"), preceded(space1, seconds)), Command::At),
        map(preceded(tag("seek"), preceded(space1, seconds)), Command::Seek),
    ))(input)
}

fn caption_spec(keyword: &'static str) -> impl FnMut(&str) -> Res<CaptionSpec> {
    move |input| {
        let (input, _) = tag(keyword)(input)?;
        let (input, id) = preceded(space1, caption_id)(input)?;
        let (input, show_at) = preceded(space1, optional_seconds)(input)?;
        let (input, hide_at) = preceded(space1, optional_seconds)(input)?;
        let (input, text) = opt(preceded(
            space1,
            take_while1(|c: char| c != '\n' && c != '\r'),
        ))(input)?;

        Ok((
            input,
            CaptionSpec {
                id,
                show_at,
                hide_at,
                text: text.map_or_else(String::new, |t| t.trim_end().to_string()),
            },
        ))
    }
}

fn times(input: &str) -> Res<Command> {
    let (input, _) = tag("times")(input)?;
    let (input, id) = preceded(space1, caption_id)(input)?;
    let (input, show_at) = preceded(space1, optional_seconds)(input)?;
    let (input, hide_at) = preceded(space1, optional_seconds)(input)?;

    Ok((
        input,
        Command::Times {
            id,
            show_at,
            hide_at,
        },
    ))
}

fn caption_id(input: &str) -> Res<CaptionId> {
    map_res(digit1, |s: &str| s.parse().map(CaptionId))(input)
}

/// `-` stands for "no time".
fn optional_seconds(input: &str) -> Res<Option<Duration>> {
    alt((value(None, tag("-")), map(seconds, Some)))(input)
}

fn seconds(input: &str) -> Res<Duration> {
    context("seconds", map_res(double, Duration::try_from_secs_f64))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    macro_rules! test_command {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let (rest, cmd) = command(input).unwrap();

                assert_eq!(rest, "");
                assert_eq!(cmd, expected);
            }
        )*
        }
    }

    test_command! {
        test_command_0: ("at 2.5", Command::At(secs(2.5))),
        test_command_1: ("at 13", Command::At(secs(13.0))),
        test_command_2: ("remove 4", Command::Remove(CaptionId(4))),
        test_command_3: ("clear", Command::Clear),
        test_command_4: ("clear-times", Command::ClearTimes),
        test_command_5: ("mute", Command::Mute(true)),
        test_command_6: ("unmute", Command::Mute(false)),
        test_command_7: ("times 3 4 -", Command::Times {
            id: CaptionId(3),
            show_at: Some(secs(4.0)),
            hide_at: None,
        }),
        test_command_8: ("caption 1 1 3 Hello there", Command::Caption(CaptionSpec {
            id: CaptionId(1),
            show_at: Some(secs(1.0)),
            hide_at: Some(secs(3.0)),
            text: "Hello there".to_string(),
        })),
        test_command_9: ("add 2 - -", Command::Add(CaptionSpec {
            id: CaptionId(2),
            show_at: None,
            hide_at: None,
            text: String::new(),
        })),
        test_command_10: ("seek 30.5", Command::Seek(secs(30.5))),
    }

    #[test]
    fn parses_a_whole_script() {
        let input = "\u{FEFF}# three captions\n\
                     caption 1 1 3 one\r\n\
                     caption 2 5 8 two # not a comment\n\
                     \n\
                     \tat 2   # playhead\n\
                     mute\n\
                     at 6";

        let commands = Parser::new().parse(input).unwrap();

        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands[1],
            Command::Caption(CaptionSpec {
                id: CaptionId(2),
                show_at: Some(secs(5.0)),
                hide_at: Some(secs(8.0)),
                text: "two # not a comment".to_string(),
            })
        );
        assert_eq!(commands[2], Command::At(secs(2.0)));
        assert_eq!(commands[4], Command::At(secs(6.0)));
    }

    #[test]
    fn empty_script_has_no_commands() {
        assert!(Parser::new().parse("").unwrap().is_empty());
        assert!(Parser::new().parse("\n  \n# nothing\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_commands() {
        let err = Parser::new().parse("at 1\nrewind 5\n").unwrap_err();

        assert!(matches!(err, SubsyncError::ParseError(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_negative_times() {
        assert!(Parser::new().parse("at -1").is_err());
        assert!(Parser::new().parse("at 1 2").is_err());
    }
}
