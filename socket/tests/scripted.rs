// Transport behavior against a scripted stream: the write retry policy,
// exact-length reads, and the line-read state machine.
use beanstalk_mock::ScriptedStream;
use beanstalk_socket::{Error, Socket};
use std::io::ErrorKind;

fn socket(stream: ScriptedStream) -> Socket<ScriptedStream> {
    Socket::with_stream(stream)
}

#[test]
fn write_delivers_every_byte_in_order() {
    let mut stream = ScriptedStream::new();
    stream.push_write_accept(3);
    stream.push_write_accept(0);
    stream.push_write_accept(5);
    // remaining attempts accept everything

    let mut socket = socket(stream);
    socket.write(b"put 0 0 60 5\r\nhello\r\n").unwrap();
    assert_eq!(socket.into_stream().written(), b"put 0 0 60 5\r\nhello\r\n");
}

#[test]
fn empty_write_makes_no_attempts() {
    let mut stream = ScriptedStream::new();
    // any attempt would consume this and stall immediately after seven more
    stream.push_write_accept(0);

    let mut socket = socket(stream);
    socket.write(b"").unwrap();
    assert_eq!(socket.into_stream().written(), b"");
}

#[test]
fn eight_zero_writes_in_a_row_fail() {
    let mut stream = ScriptedStream::new();
    for _ in 0..8 {
        stream.push_write_accept(0);
    }

    let mut socket = socket(stream);
    match socket.write(b"reserve\r\n") {
        Err(Error::Write { tries }) => assert_eq!(tries, 8),
        other => panic!("expected a write stall, got {:?}", other),
    }
}

#[test]
fn a_successful_write_resets_the_stall_counter() {
    let mut stream = ScriptedStream::new();
    for _ in 0..7 {
        stream.push_write_accept(0);
    }
    stream.push_write_accept(1);
    for _ in 0..7 {
        stream.push_write_accept(0);
    }
    // then the default kicks in and accepts the rest

    let mut socket = socket(stream);
    socket.write(b"stats\r\n").unwrap();
    assert_eq!(socket.into_stream().written(), b"stats\r\n");
}

#[test]
fn stall_triggers_once_the_good_write_ages_out() {
    let mut stream = ScriptedStream::new();
    stream.push_write_accept(1);
    for _ in 0..8 {
        stream.push_write_accept(0);
    }

    let mut socket = socket(stream);
    match socket.write(b"stats\r\n") {
        Err(Error::Write { tries }) => assert_eq!(tries, 8),
        other => panic!("expected a write stall, got {:?}", other),
    }
}

#[test]
fn write_errors_count_as_stalled_attempts() {
    let mut stream = ScriptedStream::new();
    for _ in 0..8 {
        stream.push_write_error(ErrorKind::BrokenPipe);
    }

    let mut socket = socket(stream);
    assert!(matches!(
        socket.write(b"reserve\r\n"),
        Err(Error::Write { tries: 8 })
    ));
}

#[test]
fn read_assembles_exact_length_across_chunks() {
    let mut stream = ScriptedStream::new();
    stream.push_read(b"he");
    stream.push_read_timeout();
    stream.push_read(b"llo wo");
    stream.push_read(b"rld");

    let mut socket = socket(stream);
    assert_eq!(socket.read(11).unwrap(), b"hello world");
}

#[test]
fn zero_length_read_returns_immediately() {
    let mut socket = socket(ScriptedStream::new());
    assert_eq!(socket.read(0).unwrap(), Vec::<u8>::new());
}

#[test]
fn read_returns_short_when_the_stream_ends_early() {
    let mut stream = ScriptedStream::new();
    stream.push_read(b"abc");
    stream.push_read_eof();

    let mut socket = socket(stream);
    // documented quirk: a short buffer at EOF, not an error
    assert_eq!(socket.read(10).unwrap(), b"abc");
}

#[test]
fn hard_read_failures_surface() {
    let mut stream = ScriptedStream::new();
    stream.push_read(b"ab");
    stream.push_read_error(ErrorKind::ConnectionReset);

    let mut socket = socket(stream);
    match socket.read(10) {
        Err(Error::Read(_)) => {}
        other => panic!("expected a read failure, got {:?}", other),
    }
}

#[test]
fn read_line_trims_the_terminator() {
    let mut stream = ScriptedStream::new();
    stream.push_line("JOB 5 12\r\n");

    let mut socket = socket(stream);
    assert_eq!(socket.read_line(None).unwrap(), "JOB 5 12");
}

#[test]
fn trimming_strips_trailing_blanks_but_not_leading_ones() {
    let mut stream = ScriptedStream::new();
    stream.push_line("  OK \t\r\n");

    let mut socket = socket(stream);
    assert_eq!(socket.read_line(None).unwrap(), "  OK");
}

#[test]
fn timeout_with_pending_bytes_retries_until_the_line_lands() {
    let mut stream = ScriptedStream::new();
    stream.push_no_data(true, 3);
    stream.push_no_data(true, 3);
    stream.push_line("RESERVED 42 3\r\n");

    let mut socket = socket(stream);
    assert_eq!(socket.read_line(None).unwrap(), "RESERVED 42 3");
}

#[test]
fn no_data_without_timeout_retries_too() {
    let mut stream = ScriptedStream::new();
    stream.push_no_data(false, 0);
    stream.push_line("OK 0\r\n");

    let mut socket = socket(stream);
    assert_eq!(socket.read_line(None).unwrap(), "OK 0");
}

#[test]
fn timeout_with_nothing_pending_is_a_lost_connection() {
    let mut stream = ScriptedStream::new();
    stream.push_no_data(true, 0);

    let mut socket = socket(stream);
    match socket.read_line(None) {
        Err(Error::ConnectionLost) => {}
        other => panic!("expected a lost connection, got {:?}", other),
    }
}

#[test]
fn end_of_stream_during_line_read_is_closed_by_peer() {
    let mut stream = ScriptedStream::new();
    stream.push_line_eof();

    let mut socket = socket(stream);
    match socket.read_line(None) {
        Err(Error::ClosedByPeer) => {}
        other => panic!("expected closed-by-peer, got {:?}", other),
    }
}

#[test]
fn end_of_stream_outranks_a_returned_line() {
    let mut stream = ScriptedStream::new();
    stream.push_line("DRAINING\r\n");
    stream.set_eof();

    let mut socket = socket(stream);
    assert!(matches!(socket.read_line(None), Err(Error::ClosedByPeer)));
}

#[test]
fn hard_line_read_failures_surface() {
    let mut stream = ScriptedStream::new();
    stream.push_line_error(ErrorKind::ConnectionReset);

    let mut socket = socket(stream);
    assert!(matches!(socket.read_line(None), Err(Error::Read(_))));
}
