// beanstalk-stats: example binary driving one raw round-trip through the
// socket layer. The command bytes are opaque here; framing belongs to a
// protocol layer built on top.
use beanstalk_socket::Socket;
use std::env;
use std::time::Duration;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut host = "127.0.0.1".to_string();
    let mut port = 11300u16;

    // Parse arguments: -h <host> -p <port>
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or(11300);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    println!("Connecting to beanstalkd at {}:{}", host, port);

    let mut socket = Socket::connect(&host, port, Some(Duration::from_secs(2)))
        .expect("failed to connect");

    socket.write(b"stats\r\n").expect("failed to send command");

    let header = socket.read_line(None).expect("failed to read response line");
    println!("{}", header);

    // "OK <bytes>" precedes a YAML body plus its trailing CRLF;
    // anything else is complete on one line
    if let Some(len) = header
        .strip_prefix("OK ")
        .and_then(|n| n.parse::<usize>().ok())
    {
        let body = socket.read(len + 2).expect("failed to read body");
        print!("{}", String::from_utf8_lossy(&body));
    }
}
