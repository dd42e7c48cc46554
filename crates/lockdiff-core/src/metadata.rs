use serde::Serialize;

// https://github.com/yarnpkg/berry/blob/master/packages/yarnpkg-core/sources/Manifest.ts#L25
// note: this smells like option, but realistically it is an extra property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerDependencyMeta {
  pub optional: bool,
}
