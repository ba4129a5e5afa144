//! svc-proxy 过程宏入口。
//!
//! # 设计意图（Why）
//! - 让服务作者像写“类体”一样声明服务：关联函数即服务函数，关联常量即数据属性，`fn proxy` 即 Hook；
//! - 参数解码与返回值编码的样板代码下沉到编译期展开，避免手写 `Value` 转换时的索引错误。
//!
//! # 集成方式（How）
//! - 通过 `svc_proxy_core::service` 使用（`macros` 特性默认开启）；
//! - 宏保留原 `impl` 块不变，另生成 `definition()` 关联函数，首次调用时构建并缓存服务定义。

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{
    Error, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Path, ReturnType, Type,
    ext::IdentExt, meta::ParseNestedMeta, parse_macro_input, spanned::Spanned,
};

/// 将 `impl` 块声明为服务定义。
///
/// # 语义说明（What）
/// - **输入**：无泛型、非 trait 的 inherent `impl` 块；
///   - 关联函数：不得带 `self` 接收者、泛型或引用参数，参数需实现 `DeserializeOwned`，
///     返回值需实现 `Serialize`；返回 `Result<T, E>` 时要求 `ServiceError: From<E>`；
///   - 关联常量：需实现 `Serialize`，成为数据属性；
///   - `fn proxy(name: &str, accessor: &Accessor<'_>) -> Result<Interception, ServiceError>`：成为 Hook。
/// - **选项**：`extends = Base`（Base 也需由本宏声明）、`name = "..."`、
///   `classification = lazy | resolved | body_only`。
/// - **输出**：原 `impl` 块与 `pub fn definition() -> Result<Arc<ServiceDefinition>, DefinitionError>`。
///
/// # 风险提示（Trade-offs）
/// - 所有关联函数都会成为服务属性，不希望暴露的辅助函数应放在另一个 `impl` 块中；
/// - 生成代码通过 `::svc_proxy_core` 绝对路径引用运行时，调用方需直接依赖该 crate。
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ServiceArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);

    let item = parse_macro_input!(item as ItemImpl);
    expand_service(args, item)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

#[derive(Default)]
struct ServiceArgs {
    extends: Option<Path>,
    name: Option<LitStr>,
    classification: Option<Ident>,
}

impl ServiceArgs {
    fn parse(&mut self, meta: ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("extends") {
            self.extends = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("classification") {
            let ident: Ident = meta.value()?.parse()?;
            match ident.to_string().as_str() {
                "lazy" | "resolved" | "body_only" => {
                    self.classification = Some(ident);
                    Ok(())
                }
                _ => Err(Error::new(
                    ident.span(),
                    "classification 仅支持 lazy、resolved 或 body_only",
                )),
            }
        } else {
            Err(meta.error("#[service] 仅支持 extends、name 与 classification 选项"))
        }
    }
}

fn expand_service(args: ServiceArgs, item: ItemImpl) -> Result<proc_macro2::TokenStream, Error> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new(
            path.span(),
            "#[service] 只能用于 inherent impl 块",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "#[service] 暂不支持带泛型参数的 impl 块",
        ));
    }

    let self_ty = &item.self_ty;
    let service_name = match &args.name {
        Some(name) => name.value(),
        None => type_name(self_ty)?,
    };

    let mut declarations = Vec::new();
    for member in &item.items {
        match member {
            ImplItem::Fn(func) if func.sig.ident == "proxy" => {
                declarations.push(expand_hook(self_ty, func)?);
            }
            ImplItem::Fn(func) => declarations.push(expand_function(self_ty, func)?),
            ImplItem::Const(constant) => {
                let ident = &constant.ident;
                let name = ident.unraw().to_string();
                declarations.push(quote! {
                    let builder = builder.data_serialize(#name, &<#self_ty>::#ident);
                });
            }
            _ => {}
        }
    }

    let extends = args.extends.as_ref().map(|base| {
        quote! {
            let builder = builder.extends(#base::definition()?);
        }
    });
    let classification = args.classification.as_ref().map(|mode| {
        let variant = match mode.to_string().as_str() {
            "resolved" => format_ident!("Resolved"),
            "body_only" => format_ident!("BodyOnly"),
            _ => format_ident!("Lazy"),
        };
        quote! {
            let builder = builder.classification(::svc_proxy_core::Classification::#variant);
        }
    });

    let expanded = quote! {
        #item

        impl #self_ty {
            /// 返回由 `#[service]` 声明构建的服务定义，首次调用时构建并缓存。
            pub fn definition() -> ::core::result::Result<
                ::svc_proxy_core::__private::Arc<::svc_proxy_core::ServiceDefinition>,
                ::svc_proxy_core::DefinitionError,
            > {
                static DEFINITION: ::svc_proxy_core::__private::OnceLock<
                    ::core::result::Result<
                        ::svc_proxy_core::__private::Arc<::svc_proxy_core::ServiceDefinition>,
                        ::svc_proxy_core::DefinitionError,
                    >,
                > = ::svc_proxy_core::__private::OnceLock::new();

                DEFINITION
                    .get_or_init(|| -> ::core::result::Result<
                        ::svc_proxy_core::__private::Arc<::svc_proxy_core::ServiceDefinition>,
                        ::svc_proxy_core::DefinitionError,
                    > {
                        let builder = ::svc_proxy_core::ServiceDefinition::builder(#service_name);
                        #extends
                        #classification
                        #(#declarations)*
                        builder.build()
                    })
                    .clone()
            }
        }
    };

    Ok(expanded)
}

fn type_name(ty: &Type) -> Result<String, Error> {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.unraw().to_string())
            .ok_or_else(|| Error::new(ty.span(), "无法推断服务名称")),
        _ => Err(Error::new(
            ty.span(),
            "#[service] 无法推断服务名称，请使用 name = \"...\" 显式指定",
        )),
    }
}

fn check_signature(func: &ImplItemFn) -> Result<(), Error> {
    let sig = &func.sig;
    if sig.asyncness.is_some() {
        return Err(Error::new(sig.span(), "#[service] 不支持 async fn"));
    }
    if !sig.generics.params.is_empty() {
        return Err(Error::new(
            sig.generics.span(),
            "#[service] 暂不支持带泛型参数的函数",
        ));
    }
    if let Some(receiver) = sig.receiver() {
        return Err(Error::new(
            receiver.span(),
            "服务不可实例化，服务函数不能带 self 接收者",
        ));
    }
    Ok(())
}

fn expand_hook(self_ty: &Type, func: &ImplItemFn) -> Result<proc_macro2::TokenStream, Error> {
    check_signature(func)?;
    if func.sig.inputs.len() != 2 {
        return Err(Error::new(
            func.sig.inputs.span(),
            "proxy 期望两个参数：属性名与 Accessor",
        ));
    }
    let ident = &func.sig.ident;
    Ok(quote! {
        let builder = builder.hook(::svc_proxy_core::hook_fn(<#self_ty>::#ident));
    })
}

fn expand_function(self_ty: &Type, func: &ImplItemFn) -> Result<proc_macro2::TokenStream, Error> {
    check_signature(func)?;

    let ident = &func.sig.ident;
    let name = ident.unraw().to_string();

    let mut bindings = Vec::new();
    let mut arg_idents = Vec::new();
    for (index, input) in func.sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat) = input else {
            return Err(Error::new(input.span(), "服务函数不能带 self 接收者"));
        };
        let ty = &*pat.ty;
        if matches!(ty, Type::Reference(_)) {
            return Err(Error::new(
                ty.span(),
                "服务函数参数需为拥有所有权的类型（实现 DeserializeOwned）",
            ));
        }
        let arg_ident = Ident::new(&format!("__arg{index}"), Span::call_site());
        bindings.push(quote! {
            let #arg_ident: #ty = ::svc_proxy_core::__private::arg(#name, args, #index)?;
        });
        arg_idents.push(arg_ident);
    }
    let arity = arg_idents.len();

    let invoke = if returns_result(&func.sig.output) {
        quote! { <#self_ty>::#ident(#(#arg_idents),*)? }
    } else {
        quote! { <#self_ty>::#ident(#(#arg_idents),*) }
    };

    Ok(quote! {
        let builder = builder.function_with(
            #name,
            |args: &[::svc_proxy_core::Value]| -> ::core::result::Result<
                ::svc_proxy_core::Value,
                ::svc_proxy_core::ServiceError,
            > {
                ::svc_proxy_core::__private::expect_arity(#name, args, #arity)?;
                #(#bindings)*
                #[allow(clippy::let_unit_value)]
                let output = #invoke;
                ::svc_proxy_core::__private::into_value(#name, output)
            },
        );
    })
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Result"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}
