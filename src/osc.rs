//! OSC control surface (UDP)
//!
//! Addresses, with `<p>` the configured prefix:
//!   /<p>/set/<field>   one float | int | bool | string argument
//!   /<p>/list/params   reply: /<p>/reply/list/params (field ids of the live effect)
//!   /<p>/get/<field>   reply: /<p>/reply/get/<field> (value, or "unknown_param")
//!   /<p>/effect/next, /<p>/effect/prev
//!   /<p>/export
//!
//! The listener thread never touches the session. It answers queries from the
//! published snapshot and forwards everything else to the render thread.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rosc::{OscMessage, OscPacket, OscType};
use silkrays_engine::config::OscConfig;
use silkrays_engine::{logi, logw, ParamValue};

use crate::app::Snapshot;

/// Commands forwarded to the render thread.
#[derive(Debug, Clone, PartialEq)]
pub enum OscCommand {
    Set { field: String, value: ParamValue },
    NextEffect,
    PrevEffect,
    Export,
}

#[derive(Debug, Clone, PartialEq)]
enum Request {
    Command(OscCommand),
    ListParams,
    Get(String),
}

pub struct OscHandle {
    stop_tx: Sender<()>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl Drop for OscHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Start the listener if enabled. Commands arrive on the returned receiver.
pub fn connect_osc(cfg: &OscConfig, snapshot: Snapshot) -> Option<(OscHandle, Receiver<OscCommand>)> {
    if !cfg.enabled {
        return None;
    }

    let bind = cfg.bind.clone();
    let prefix = normalize_prefix(&cfg.prefix);

    let sock = match UdpSocket::bind(&bind) {
        Ok(s) => s,
        Err(e) => {
            logw!("OSC", "failed to bind {bind}: {e}");
            return None;
        }
    };
    if let Err(e) = sock.set_read_timeout(Some(Duration::from_millis(50))) {
        logw!("OSC", "set_read_timeout failed: {e}");
    }

    logi!("OSC", "listening on {bind} prefix={prefix}");
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<OscCommand>();

    let spawned = std::thread::Builder::new().name("osc".to_string()).spawn(move || {
        let mut buf = [0u8; 2048];
        loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }
            match sock.recv_from(&mut buf) {
                Ok((sz, from)) => match rosc::decoder::decode_udp(&buf[..sz]) {
                    Ok((_rest, pkt)) => handle_packet(pkt, &prefix, &snapshot, &cmd_tx, &sock, from),
                    Err(e) => logw!("OSC", "undecodable packet from {from}: {e:?}"),
                },
                // timeout: loop around and check for stop
                Err(_) => {}
            }
        }
        logi!("OSC", "stopped");
    });

    match spawned {
        Ok(join) => Some((OscHandle { stop_tx, join: Some(join) }, cmd_rx)),
        Err(e) => {
            logw!("OSC", "failed to spawn listener thread: {e}");
            None
        }
    }
}

fn normalize_prefix(p: &str) -> String {
    format!("/{}", p.trim_matches('/'))
}

fn handle_packet(
    pkt: OscPacket,
    prefix: &str,
    snapshot: &Snapshot,
    tx: &Sender<OscCommand>,
    sock: &UdpSocket,
    from: SocketAddr,
) {
    match pkt {
        OscPacket::Message(msg) => match parse_request(prefix, &msg.addr, &msg.args) {
            Some(Request::Command(cmd)) => {
                let _ = tx.send(cmd);
            }
            Some(Request::ListParams) => {
                let fields = snapshot.read().map(|c| c.fields()).unwrap_or(&[]);
                let args = fields.iter().map(|f| OscType::String(f.to_string())).collect();
                send_reply(sock, from, format!("{prefix}/reply/list/params"), args);
                logi!("OSC", "introspect list/params -> {} items", fields.len());
            }
            Some(Request::Get(field)) => {
                let value = snapshot.read().ok().and_then(|c| c.get(&field));
                let arg = match value {
                    Some(ParamValue::Number(v)) => OscType::Float(v),
                    Some(ParamValue::Text(s)) => OscType::String(s),
                    Some(ParamValue::Flag(b)) => OscType::Bool(b),
                    None => OscType::String("unknown_param".into()),
                };
                send_reply(sock, from, format!("{prefix}/reply/get/{field}"), vec![arg]);
            }
            None => logw!("OSC", "unhandled {} ({} args)", msg.addr, msg.args.len()),
        },
        OscPacket::Bundle(b) => {
            for p in b.content {
                handle_packet(p, prefix, snapshot, tx, sock, from);
            }
        }
    }
}

fn send_reply(sock: &UdpSocket, to: SocketAddr, addr: String, args: Vec<OscType>) {
    let pkt = OscPacket::Message(OscMessage { addr, args });
    match rosc::encoder::encode(&pkt) {
        Ok(buf) => {
            let _ = sock.send_to(&buf, to);
        }
        Err(e) => logw!("OSC", "encode error: {e:?}"),
    }
}

fn parse_request(prefix: &str, addr: &str, args: &[OscType]) -> Option<Request> {
    let rest = addr.strip_prefix(prefix)?.strip_prefix('/')?;
    let req = match rest {
        "list/params" | "list" => Request::ListParams,
        "effect/next" => Request::Command(OscCommand::NextEffect),
        "effect/prev" => Request::Command(OscCommand::PrevEffect),
        "export" => Request::Command(OscCommand::Export),
        _ => {
            if let Some(field) = rest.strip_prefix("get/") {
                Request::Get(field.to_string())
            } else if let Some(field) = rest.strip_prefix("set/") {
                let value = arg_value(args.first()?)?;
                Request::Command(OscCommand::Set {
                    field: field.to_string(),
                    value,
                })
            } else {
                return None;
            }
        }
    };
    Some(req)
}

fn arg_value(a: &OscType) -> Option<ParamValue> {
    Some(match a {
        OscType::Float(f) => ParamValue::Number(*f),
        OscType::Double(d) => ParamValue::Number(*d as f32),
        OscType::Int(i) => ParamValue::Number(*i as f32),
        OscType::Long(i) => ParamValue::Number(*i as f32),
        OscType::Bool(b) => ParamValue::Flag(*b),
        OscType::String(s) => ParamValue::Text(s.clone()),
        _ => return None,
    })
}
