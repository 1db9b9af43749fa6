use super::{Error, User};
use crate::{
    dav::fs::methods::{route_get, route_mkcol, route_put},
    filesystem::{DavMetadata, Filesystem, FilesystemProvider},
};
use async_trait::async_trait;
use axum::handler::Handler;
use derive_more::{Constructor, Deref};
use httpdate::HttpDate;
use rustical_dav::{
    Principal,
    privileges::UserPrivilegeSet,
    resource::{
        AxumMethods, MethodFunction, PrincipalUri, Resource, ResourceName, ResourceService,
    },
    xml::{Resourcetype, ResourcetypeInner},
};
use rustical_xml::{EnumVariants, PropName, XmlDeserialize, XmlSerialize};
use scoped_fs::ScopedPath;
use serde::Deserialize;
use share_types::{Node, ShareTypeList};
use std::{borrow::Cow, sync::Arc, time::SystemTime};
use tower::Service;

mod methods;
mod shares;

pub use shares::{RequestShares, ShareTypes, SharedDirectory};

#[derive(Debug, Clone)]
pub struct FSPrincipalUri;

impl PrincipalUri for FSPrincipalUri {
    fn principal_collection(&self) -> String {
        "/dav/mount/".into()
    }
    fn principal_uri(&self, principal: &str) -> String {
        format!("/dav/mount/{principal}/")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FSResourceServicePath {
    mount: String,
    #[serde(default)]
    path: ScopedPath,
}

#[derive(Constructor, Deref)]
pub struct FSResourceService<FSP: FilesystemProvider> {
    #[deref]
    provider: Arc<FSP>,
    shares: SharedDirectory,
}

impl<FSP: FilesystemProvider> Clone for FSResourceService<FSP> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            shares: self.shares.clone(),
        }
    }
}

#[async_trait]
impl<FSP: FilesystemProvider> ResourceService for FSResourceService<FSP> {
    type MemberType = FSResource<FSP>;
    type Principal = User;
    type PathComponents = FSResourceServicePath;
    type Error = Error;
    type Resource = FSResource<FSP>;
    type PrincipalUri = FSPrincipalUri;

    const DAV_HEADER: &str = "1, 3, access-control";

    async fn get_resource(
        &self,
        path: &Self::PathComponents,
        _show_deleted: bool,
    ) -> Result<Self::Resource, Self::Error> {
        let fs = self.get_filesystem(&path.mount).await?;
        let metadata = fs.metadata(&path.path).await?;
        // A folder resolves through its listing pass, so a malformed child
        // leaves the folder without share types at any depth
        let shares = if metadata.is_dir() {
            let folder = Node::new(metadata.node_id().0, path.path.as_str(), metadata.node_kind());
            RequestShares::for_listing(fs, self.shares.clone(), folder)
        } else {
            RequestShares::new(fs, self.shares.clone())
        };
        Ok(FSResource {
            mount: path.mount.clone(),
            path: path.path.to_owned(),
            metadata,
            shares,
        })
    }

    async fn get_members(
        &self,
        path: &Self::PathComponents,
    ) -> Result<Vec<Self::MemberType>, Self::Error> {
        let filesystem = self.get_filesystem(&path.mount).await?;
        let meta = filesystem.metadata(&path.path).await?;
        if !meta.is_dir() {
            return Ok(vec![]);
        }

        let mut entries = vec![];
        for entry in filesystem.list_dir(&path.path).await? {
            let metadata = filesystem.metadata(&entry).await?;
            entries.push((entry, metadata));
        }

        let folder = Node::new(meta.node_id().0, path.path.as_str(), meta.node_kind());
        let shares = RequestShares::for_listing(filesystem, self.shares.clone(), folder);
        Ok(entries
            .into_iter()
            .map(|(entry, metadata)| FSResource {
                mount: path.mount.clone(),
                path: entry,
                metadata,
                shares: shares.clone(),
            })
            .collect())
    }

    async fn delete_resource(
        &self,
        path: &Self::PathComponents,
        _use_trashbin: bool,
    ) -> Result<(), Self::Error> {
        let filesystem = self.get_filesystem(&path.mount).await?;
        filesystem.delete(&path.path).await?;
        Ok(())
    }

    async fn copy_resource(
        &self,
        FSResourceServicePath { mount, path }: &Self::PathComponents,
        FSResourceServicePath {
            mount: dest_mount,
            path: dest_path,
        }: &Self::PathComponents,
        _user: &Self::Principal,
        overwrite: bool,
    ) -> Result<bool, Self::Error> {
        if mount != dest_mount {
            return Err(Error::BadRequest("cannot copy across mounts".to_owned()));
        }

        let fs = self.get_filesystem(mount).await?;
        Ok(fs.copy(path, dest_path, overwrite).await?)
    }

    async fn move_resource(
        &self,
        FSResourceServicePath { mount, path }: &Self::PathComponents,
        FSResourceServicePath {
            mount: dest_mount,
            path: dest_path,
        }: &Self::PathComponents,
        _user: &Self::Principal,
        overwrite: bool,
    ) -> Result<bool, Self::Error> {
        if mount != dest_mount {
            return Err(Error::BadRequest("cannot move across mounts".to_owned()));
        }

        let fs = self.get_filesystem(mount).await?;
        Ok(fs.mv(path, dest_path, overwrite).await?)
    }
}

pub struct FSResource<FSP: FilesystemProvider> {
    pub mount: String,
    pub path: ScopedPath,
    pub metadata: <FSP::FS as Filesystem>::Metadata,
    shares: RequestShares<FSP::FS>,
}

impl<FSP: FilesystemProvider> Clone for FSResource<FSP> {
    fn clone(&self) -> Self {
        Self {
            mount: self.mount.clone(),
            path: self.path.clone(),
            metadata: self.metadata.clone(),
            shares: self.shares.clone(),
        }
    }
}

impl<FSP: FilesystemProvider> ResourceName for FSResource<FSP> {
    fn get_name(&self) -> Cow<'_, str> {
        self.path.file_name().into()
    }
}

#[derive(XmlDeserialize, XmlSerialize, PartialEq, Clone, EnumVariants, PropName)]
#[xml(unit_variants_ident = "FSResourcePropName")]
pub enum FSResourceProp {
    // WebDAV (RFC 4918)
    #[xml(skip_deserializing)]
    #[xml(ns = "rustical_dav::namespace::NS_DAV")]
    Resourcetype(Resourcetype),
    #[xml(ns = "rustical_dav::namespace::NS_DAV")]
    Getcontentlength(u64),
    #[xml(ns = "rustical_dav::namespace::NS_DAV")]
    Creationdate(String),
    #[xml(ns = "rustical_dav::namespace::NS_DAV")]
    Getlastmodified(String),
    #[xml(ns = "rustical_dav::namespace::NS_DAV")]
    Getcontenttype(Option<String>),
    #[xml(ns = "rustical_dav::namespace::NS_DAV")]
    Getetag(Option<String>),

    // ownCloud extensions, read-only
    #[xml(skip_deserializing)]
    #[xml(ns = "crate::dav::NS_OWNCLOUD")]
    ShareTypes(Option<ShareTypes>),
    #[xml(skip_deserializing)]
    #[xml(ns = "crate::dav::NS_OWNCLOUD")]
    Fileid(u64),
}

impl<FSP: FilesystemProvider> FSResource<FSP> {
    pub fn get_content_type(&self) -> Option<&'static str> {
        self.path
            .file_extension()
            .and_then(|ext| mime_guess::from_ext(ext).first_raw())
    }

    pub fn node(&self) -> Node {
        Node::new(
            self.metadata.node_id().0,
            self.path.as_str(),
            self.metadata.node_kind(),
        )
    }

    /// Share types `user` created on this resource, `None` where the
    /// property stays unset.
    pub fn share_types(&self, user: &User) -> Result<Option<ShareTypeList>, Error> {
        Ok(self.shares.share_types(user.get_id(), &self.node())?)
    }
}

impl<FSP: FilesystemProvider> Resource for FSResource<FSP> {
    type Prop = FSResourceProp;
    type Error = Error;
    type Principal = User;

    fn is_collection(&self) -> bool {
        self.metadata.is_dir()
    }

    fn get_resourcetype(&self) -> Resourcetype {
        if self.metadata.is_dir() {
            Resourcetype(&[ResourcetypeInner(
                Some(rustical_dav::namespace::NS_DAV),
                "collection",
            )])
        } else {
            Resourcetype(&[])
        }
    }

    fn get_prop(
        &self,
        _puri: &impl PrincipalUri,
        user: &User,
        prop: &FSResourcePropName,
    ) -> Result<Self::Prop, Self::Error> {
        Ok(match prop {
            FSResourcePropName::Resourcetype => {
                FSResourceProp::Resourcetype(self.get_resourcetype())
            }
            FSResourcePropName::Getcontentlength => {
                FSResourceProp::Getcontentlength(self.metadata.len())
            }
            FSResourcePropName::Creationdate => {
                FSResourceProp::Creationdate(HttpDate::from(self.metadata.created()).to_string())
            }
            FSResourcePropName::Getlastmodified => FSResourceProp::Getlastmodified(
                HttpDate::from(self.metadata.modified()).to_string(),
            ),
            FSResourcePropName::Getcontenttype => {
                FSResourceProp::Getcontenttype(self.get_content_type().map(|mime| mime.to_owned()))
            }
            FSResourcePropName::Getetag => FSResourceProp::Getetag(self.get_etag()),
            FSResourcePropName::ShareTypes => {
                FSResourceProp::ShareTypes(self.share_types(user)?.map(ShareTypes::from))
            }
            FSResourcePropName::Fileid => FSResourceProp::Fileid(self.metadata.node_id().0),
        })
    }

    fn get_displayname(&self) -> Option<&str> {
        Some(self.path.file_name())
    }

    fn get_owner(&self) -> Option<&str> {
        Some(&self.mount)
    }

    fn get_user_privileges(&self, _user: &User) -> Result<UserPrivilegeSet, Self::Error> {
        Ok(UserPrivilegeSet::all())
    }

    fn get_etag(&self) -> Option<String> {
        let modified = self
            .metadata
            .modified()
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?
            .as_millis();
        let size = self.metadata.len();
        Some(format!("\"{size}-{modified}\""))
    }
}

impl<FSP: FilesystemProvider> AxumMethods for FSResourceService<FSP> {
    fn get() -> Option<MethodFunction<Self>> {
        Some(|state, req| {
            let mut service = Handler::with_state(route_get, state);
            Box::pin(Service::call(&mut service, req))
        })
    }

    fn put() -> Option<MethodFunction<Self>> {
        Some(|state, req| {
            let mut service = Handler::with_state(route_put, state);
            Box::pin(Service::call(&mut service, req))
        })
    }

    fn mkcol() -> Option<MethodFunction<Self>> {
        Some(|state, req| {
            let mut service = Handler::with_state(route_mkcol, state);
            Box::pin(Service::call(&mut service, req))
        })
    }
}
