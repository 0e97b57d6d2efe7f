//! Generated gRPC types for the `chord` package.

tonic::include_proto!("chord");
