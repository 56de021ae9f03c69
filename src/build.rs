extern crate capnpc;

fn main() {
    ::capnpc::CompilerCommand::new()
        .src_prefix("schema")
        .file("schema/member_status.capnp")
        .file("schema/log_record.capnp")
        .run()
        .expect("compiling member-status/log-record schemas");
}
