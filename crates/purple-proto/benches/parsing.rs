//! Benchmarks for IRC line parsing and formatting.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use purple_proto::{format::LineBuilder, Message};

const SIMPLE_MESSAGE: &str = "PING :irc.example.com";

const PREFIX_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :Hello, world!";

const WHO_REPLY: &str =
    ":irc.example.net 352 me #chan ~ident host.example.org irc.example.net bob H@ :0 Bob Example";

const NAMES_REPLY: &str =
    ":irc.example.net 353 me = #chan :@alice +bob carol dave eve %frank mallory trent victor";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    for (name, line) in [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("who_reply", WHO_REPLY),
        ("names_reply", NAMES_REPLY),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let msg: Message = black_box(line).parse().unwrap();
                black_box(msg.padded(8).len())
            })
        });
    }

    group.finish();
}

fn benchmark_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Formatting");

    group.bench_function("privmsg", |b| {
        b.iter(|| {
            black_box(
                LineBuilder::new("PRIVMSG")
                    .nick(black_box("bob"))
                    .trailing(black_box("Hello, world!"))
                    .build(),
            )
        })
    });

    group.bench_function("user", |b| {
        b.iter(|| {
            black_box(
                LineBuilder::new("USER")
                    .verbatim("ident")
                    .verbatim("*")
                    .verbatim("irc.example.net")
                    .trailing("purple")
                    .build(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_parsing, benchmark_formatting);
criterion_main!(benches);
