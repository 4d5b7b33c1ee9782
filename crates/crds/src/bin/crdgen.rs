//! Prints the HTTPScaledObject CustomResourceDefinition as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/httpscaledobjects.yaml`

use crds::HTTPScaledObject;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = HTTPScaledObject::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
